//! API-boundary error kinds (spec §7).

use crate::id::{AgentId, WorkflowId};
use thiserror::Error;

/// Error kinds surfaced at the Public API Port boundary (C8) and used
/// internally to decide workflow-terminal transitions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FleetError {
    #[error("bus unavailable: {0}")]
    BusUnavailable(String),

    #[error("agent {0} is unavailable")]
    AgentUnavailable(AgentId),

    #[error("agent {agent_id} has no module named {module_name:?}")]
    ModuleUnknown { agent_id: AgentId, module_name: String },

    #[error("request rejected by schema for module {module_name:?}: {reason}")]
    SchemaRejected { module_name: String, reason: String },

    #[error("worker did not stop within the bound")]
    StopTimeout,

    #[error("execution queue is full")]
    QueueFull,

    #[error("workflow {0} not found")]
    WorkflowNotFound(WorkflowId),

    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),
}
