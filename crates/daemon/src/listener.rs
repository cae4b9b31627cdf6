//! Control-socket listener (spec §4.8's Public API Port, exposed over the
//! wire). Grounded on `listener/mod.rs`'s accept-loop-spawns-per-connection
//! shape and `handle_connection`'s read-one-request/write-one-response
//! cycle, narrowed to `fleet-wire`'s length-prefixed JSON framing and a
//! single Unix domain socket (spec names no TCP control surface).

use fleet_bus::BusClient;
use fleet_coordinator::ApiPort;
use fleet_core::AgentRecord;
use fleet_wire::{AgentSummary, ProtocolError, Request, Response, WorkflowSummary};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};

#[derive(Debug, Error)]
pub enum ListenError {
    #[error("failed to bind control socket at {path}: {source}")]
    Bind { path: String, source: std::io::Error },
}

fn to_summary(record: AgentRecord) -> AgentSummary {
    AgentSummary {
        id: record.id,
        name: record.name,
        hostname: record.hostname,
        alive: record.alive,
        heartbeat_count: record.heartbeat_count,
        module_names: record.capabilities.modules.keys().cloned().collect(),
    }
}

fn to_workflow_summary(workflow: &fleet_core::Workflow) -> WorkflowSummary {
    WorkflowSummary { id: workflow.id, agent_id: workflow.agent_id, module_name: workflow.module_name.clone(), state: workflow.current_state() }
}

async fn dispatch<B: BusClient>(api: &ApiPort<B>, request: Request) -> Response {
    match request {
        Request::ListAgents { filter } => Response::Agents { agents: api.list_agents(filter).into_iter().map(to_summary).collect() },
        Request::GetAgent { agent_id } => Response::Agent { agent: api.get_agent(&agent_id).map(to_summary) },
        Request::ExecuteModule { agent_id, module_name, request_body, mode } => match api.execute_module(agent_id, &module_name, request_body, mode).await {
            Ok(workflow_id) => Response::Accepted { workflow_id },
            Err(err) => err.into(),
        },
        Request::ListWorkflows { status, limit } => Response::Workflows { workflows: api.list_workflows(status, limit).iter().map(to_workflow_summary).collect() },
        Request::GetWorkflow { workflow_id } => Response::Workflow { workflow: api.get_workflow(&workflow_id).map(Box::new) },
        Request::CancelWorkflow { workflow_id } => match api.cancel_workflow(workflow_id) {
            Ok(state) => Response::Cancelled { workflow_id, state },
            Err(err) => err.into(),
        },
    }
}

async fn handle_connection<B: BusClient>(mut stream: UnixStream, api: Arc<ApiPort<B>>) {
    let (mut reader, mut writer) = stream.split();
    loop {
        let request: Request = match fleet_wire::read_message(&mut reader).await {
            Ok(Some(request)) => request,
            Ok(None) => return,
            Err(ProtocolError::Json(error)) => {
                let response = Response::Error { message: format!("malformed request: {error}") };
                let _ = fleet_wire::write_message(&mut writer, &response).await;
                continue;
            }
            Err(error) => {
                tracing::warn!(%error, "control socket read failed");
                return;
            }
        };
        let response = dispatch(&api, request).await;
        if let Err(error) = fleet_wire::write_message(&mut writer, &response).await {
            tracing::warn!(%error, "control socket write failed");
            return;
        }
    }
}

/// Binds the Unix socket at `path` (removing a stale one left behind by an
/// unclean shutdown) and serves connections until `shutdown` resolves.
pub async fn serve<B: BusClient>(path: &Path, api: Arc<ApiPort<B>>, mut shutdown: tokio::sync::oneshot::Receiver<()>) -> Result<(), ListenError> {
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }
    let listener = UnixListener::bind(path).map_err(|source| ListenError::Bind { path: path.display().to_string(), source })?;
    tracing::info!(path = %path.display(), "control socket listening");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let api = Arc::clone(&api);
                        tokio::spawn(async move { handle_connection(stream, api).await });
                    }
                    Err(error) => tracing::error!(%error, "control socket accept error"),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("control socket shutting down");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
