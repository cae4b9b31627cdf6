use crate::client;
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};
use clap::{Subcommand, ValueEnum};
use fleet_core::AgentId;
use fleet_wire::{AgentFilter as WireAgentFilter, Request, Response};
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum AgentFilterArg {
    #[default]
    All,
    Alive,
    Dead,
}

impl From<AgentFilterArg> for WireAgentFilter {
    fn from(arg: AgentFilterArg) -> Self {
        match arg {
            AgentFilterArg::All => WireAgentFilter::All,
            AgentFilterArg::Alive => WireAgentFilter::Alive,
            AgentFilterArg::Dead => WireAgentFilter::Dead,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AgentsCommand {
    /// List known agents.
    List {
        #[arg(long, value_enum, default_value_t = AgentFilterArg::All)]
        filter: AgentFilterArg,
    },
    /// Show one agent by ID.
    Show { agent_id: String },
}

pub async fn run(cmd: AgentsCommand, socket: &Path, format: OutputFormat) -> Result<(), ExitError> {
    let request = match &cmd {
        AgentsCommand::List { filter } => Request::ListAgents { filter: (*filter).into() },
        AgentsCommand::Show { agent_id } => Request::GetAgent { agent_id: AgentId::from_string(agent_id) },
    };

    let response = client::roundtrip(socket, request)
        .await
        .map_err(|error| ExitError::new(1, error.to_string()))?;

    match (cmd, response) {
        (AgentsCommand::List { .. }, Response::Agents { agents }) => {
            output::print_agents(&agents, format).map_err(|error| ExitError::new(1, error.to_string()))
        }
        (AgentsCommand::Show { .. }, Response::Agent { agent }) => {
            output::print_agent(agent.as_ref(), format).map_err(|error| ExitError::new(1, error.to_string()))
        }
        (_, Response::Error { message }) => Err(ExitError::new(1, message)),
        (_, other) => Err(ExitError::new(1, format!("unexpected response from daemon: {other:?}"))),
    }
}

#[cfg(test)]
#[path = "agents_tests.rs"]
mod tests;
