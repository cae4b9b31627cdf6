use crate::client;
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};
use clap::{Subcommand, ValueEnum};
use fleet_core::{WorkflowId, WorkflowState};
use fleet_wire::{Request, Response};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum WorkflowStateArg {
    Running,
    Completed,
    Failed,
}

impl From<WorkflowStateArg> for WorkflowState {
    fn from(arg: WorkflowStateArg) -> Self {
        match arg {
            WorkflowStateArg::Running => WorkflowState::Running,
            WorkflowStateArg::Completed => WorkflowState::Completed,
            WorkflowStateArg::Failed => WorkflowState::Failed,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum WorkflowsCommand {
    /// List accepted workflows, most recent first.
    List {
        #[arg(long, value_enum)]
        status: Option<WorkflowStateArg>,
        #[arg(long, default_value_t = fleet_wire::MAX_LIST_WORKFLOWS_LIMIT)]
        limit: usize,
    },
    /// Show one workflow's full transition history.
    Show { workflow_id: String },
    /// Mark a running workflow FAILED.
    Cancel { workflow_id: String },
}

pub async fn run(cmd: WorkflowsCommand, socket: &Path, format: OutputFormat) -> Result<(), ExitError> {
    let request = match &cmd {
        WorkflowsCommand::List { status, limit } => {
            Request::ListWorkflows { status: status.map(|s| s.into()), limit: *limit }
        }
        WorkflowsCommand::Show { workflow_id } => Request::GetWorkflow { workflow_id: WorkflowId::from_string(workflow_id) },
        WorkflowsCommand::Cancel { workflow_id } => Request::CancelWorkflow { workflow_id: WorkflowId::from_string(workflow_id) },
    };

    let response = client::roundtrip(socket, request)
        .await
        .map_err(|error| ExitError::new(1, error.to_string()))?;

    match (cmd, response) {
        (WorkflowsCommand::List { .. }, Response::Workflows { workflows }) => {
            output::print_workflows(&workflows, format).map_err(|error| ExitError::new(1, error.to_string()))
        }
        (WorkflowsCommand::Show { .. }, Response::Workflow { workflow }) => {
            output::print_workflow(workflow.as_deref(), format).map_err(|error| ExitError::new(1, error.to_string()))
        }
        (WorkflowsCommand::Cancel { .. }, Response::Cancelled { workflow_id, state }) => {
            println!("workflow {workflow_id} is now {state:?}");
            Ok(())
        }
        (_, Response::Error { message }) => Err(ExitError::new(1, message)),
        (_, other) => Err(ExitError::new(1, format!("unexpected response from daemon: {other:?}"))),
    }
}

#[cfg(test)]
#[path = "workflows_tests.rs"]
mod tests;
