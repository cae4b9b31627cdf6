//! Control-socket request types: the wire shape of the Public API Port
//! (spec §4.8). Grounded on `crates/wire/src/{lib.rs,response.rs}`'s
//! tagged-enum IPC style.

use fleet_core::{AgentId, WorkflowId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentFilter {
    #[default]
    All,
    Alive,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    #[default]
    Sync,
    Async,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    ListAgents {
        #[serde(default)]
        filter: AgentFilter,
    },
    GetAgent {
        agent_id: AgentId,
    },
    ExecuteModule {
        agent_id: AgentId,
        module_name: String,
        request_body: serde_json::Value,
        #[serde(default)]
        mode: ExecMode,
    },
    ListWorkflows {
        #[serde(default)]
        status: Option<fleet_core::WorkflowState>,
        #[serde(default = "default_limit")]
        limit: usize,
    },
    GetWorkflow {
        workflow_id: WorkflowId,
    },
    CancelWorkflow {
        workflow_id: WorkflowId,
    },
}

fn default_limit() -> usize {
    1000
}

/// The hard ceiling spec §4.8 puts on `ListWorkflows`.
pub const MAX_LIST_WORKFLOWS_LIMIT: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_workflows_defaults_limit_to_one_thousand() {
        let json = serde_json::json!({"type": "ListWorkflows"});
        let req: Request = serde_json::from_value(json).unwrap();
        match req {
            Request::ListWorkflows { limit, status } => {
                assert_eq!(limit, 1000);
                assert_eq!(status, None);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn execute_module_defaults_to_sync() {
        let json = serde_json::json!({
            "type": "ExecuteModule",
            "agent_id": "agt-0000000000000000000",
            "module_name": "echo",
            "request_body": {"message": "hi"}
        });
        let req: Request = serde_json::from_value(json).unwrap();
        match req {
            Request::ExecuteModule { mode, .. } => assert_eq!(mode, ExecMode::Sync),
            other => panic!("unexpected request: {other:?}"),
        }
    }
}
