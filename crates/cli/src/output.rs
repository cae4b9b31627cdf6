use clap::ValueEnum;
use fleet_core::Workflow;
use fleet_wire::{AgentSummary, WorkflowSummary};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_agents(agents: &[AgentSummary], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&agents),
        OutputFormat::Text => {
            if agents.is_empty() {
                println!("no agents");
                return Ok(());
            }
            println!("{}", crate::color::header("ID                       NAME            HOSTNAME        ALIVE  HEARTBEATS  MODULES"));
            for agent in agents {
                println!(
                    "{:<24} {:<15} {:<15} {:<6} {:<11} {}",
                    agent.id,
                    agent.name,
                    agent.hostname,
                    agent.alive,
                    agent.heartbeat_count,
                    agent.module_names.join(","),
                );
            }
            Ok(())
        }
    }
}

pub fn print_agent(agent: Option<&AgentSummary>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&agent),
        OutputFormat::Text => match agent {
            Some(agent) => print_agents(std::slice::from_ref(agent), format),
            None => {
                println!("agent not found");
                Ok(())
            }
        },
    }
}

pub fn print_workflows(workflows: &[WorkflowSummary], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&workflows),
        OutputFormat::Text => {
            if workflows.is_empty() {
                println!("no workflows");
                return Ok(());
            }
            println!("{}", crate::color::header("ID                       AGENT                    MODULE     STATE"));
            for workflow in workflows {
                println!("{:<24} {:<24} {:<10} {:?}", workflow.id, workflow.agent_id, workflow.module_name, workflow.state);
            }
            Ok(())
        }
    }
}

pub fn print_workflow(workflow: Option<&Workflow>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&workflow),
        OutputFormat::Text => match workflow {
            Some(workflow) => {
                println!("id:       {}", workflow.id);
                println!("agent:    {}", workflow.agent_id);
                println!("module:   {}", workflow.module_name);
                println!("state:    {:?}", workflow.current_state());
                println!("history:");
                for transition in &workflow.history {
                    let reason = transition.reason.as_deref().unwrap_or("-");
                    println!("  {:?} at {} ({})", transition.state, transition.at, reason);
                }
                Ok(())
            }
            None => {
                println!("workflow not found");
                Ok(())
            }
        },
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
