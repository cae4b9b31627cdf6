use crate::client;
use crate::exit_error::ExitError;
use clap::Args;
use fleet_core::AgentId;
use fleet_wire::{ExecMode, Request, Response};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ExecCommand {
    /// Agent to run the module on.
    agent_id: String,
    /// Module name, as advertised in the agent's capability document.
    module: String,
    /// Request body, as a JSON object.
    request: String,
    /// Don't wait for the daemon to accept synchronously (spec §4.8 async mode).
    #[arg(long)]
    r#async: bool,
}

pub async fn run(cmd: ExecCommand, socket: &Path) -> Result<(), ExitError> {
    let request_body: serde_json::Value =
        serde_json::from_str(&cmd.request).map_err(|error| ExitError::new(2, format!("request body is not valid JSON: {error}")))?;

    let request = Request::ExecuteModule {
        agent_id: AgentId::from_string(&cmd.agent_id),
        module_name: cmd.module,
        request_body,
        mode: if cmd.r#async { ExecMode::Async } else { ExecMode::Sync },
    };

    let response = client::roundtrip(socket, request).await.map_err(|error| ExitError::new(1, error.to_string()))?;

    match response {
        Response::Accepted { workflow_id } => {
            println!("{workflow_id}");
            Ok(())
        }
        Response::Error { message } => Err(ExitError::new(1, message)),
        other => Err(ExitError::new(1, format!("unexpected response from daemon: {other:?}"))),
    }
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
