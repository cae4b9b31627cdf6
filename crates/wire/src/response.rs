//! Control-socket response types.

use fleet_core::{AgentId, FleetError, Workflow, WorkflowId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: AgentId,
    pub name: String,
    pub hostname: String,
    pub alive: bool,
    pub heartbeat_count: u64,
    pub module_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub agent_id: AgentId,
    pub module_name: String,
    pub state: fleet_core::WorkflowState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Agents { agents: Vec<AgentSummary> },
    Agent { agent: Option<AgentSummary> },
    Accepted { workflow_id: WorkflowId },
    Workflows { workflows: Vec<WorkflowSummary> },
    Workflow { workflow: Option<Box<Workflow>> },
    Cancelled { workflow_id: WorkflowId, state: fleet_core::WorkflowState },
    Error { message: String },
}

impl From<FleetError> for Response {
    fn from(err: FleetError) -> Self {
        Response::Error { message: err.to_string() }
    }
}
