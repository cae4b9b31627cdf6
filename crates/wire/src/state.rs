//! Per-invocation module state message (spec §4.2 "State-message schema").
//!
//! Canonical subject: `<agent>.module.state`. The wire enum keeps all five
//! values the agent-side runtime can emit (`original_source/base.py`'s
//! `ModuleStateEnum`: started/running/completed/error/failed); the
//! coordinator's agent-state handler (spec §4.6) folds them down to the
//! three domain [`fleet_core::WorkflowState`] values.

use fleet_core::{AgentId, WorkflowId, WorkflowState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireModuleState {
    Started,
    Running,
    Completed,
    Error,
    Failed,
}

impl WireModuleState {
    /// Spec §4.6 "Agent-state handler" mapping. `None` means "ignore".
    pub fn to_domain(self) -> Option<WorkflowState> {
        match self {
            Self::Started | Self::Running => Some(WorkflowState::Running),
            Self::Completed => Some(WorkflowState::Completed),
            Self::Error | Self::Failed => Some(WorkflowState::Failed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMessage {
    pub agent_id: AgentId,
    pub module_name: String,
    pub state: WireModuleState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl StateMessage {
    pub fn started(agent_id: AgentId, module_name: impl Into<String>, workflow_id: Option<WorkflowId>) -> Self {
        Self { agent_id, module_name: module_name.into(), state: WireModuleState::Started, workflow_id, error_message: None, details: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_and_running_map_to_domain_running() {
        assert_eq!(WireModuleState::Started.to_domain(), Some(WorkflowState::Running));
        assert_eq!(WireModuleState::Running.to_domain(), Some(WorkflowState::Running));
    }

    #[test]
    fn error_and_failed_map_to_domain_failed() {
        assert_eq!(WireModuleState::Error.to_domain(), Some(WorkflowState::Failed));
        assert_eq!(WireModuleState::Failed.to_domain(), Some(WorkflowState::Failed));
    }

    #[test]
    fn completed_maps_to_domain_completed() {
        assert_eq!(WireModuleState::Completed.to_domain(), Some(WorkflowState::Completed));
    }

    #[test]
    fn serializes_with_lowercase_tags() {
        let json = serde_json::to_value(WireModuleState::Failed).unwrap();
        assert_eq!(json, serde_json::json!("failed"));
    }

    #[test]
    fn state_message_omits_absent_optionals() {
        let msg = StateMessage::started(AgentId::new(), "echo", None);
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("workflow_id").is_none());
        assert!(json.get("error_message").is_none());
    }
}
