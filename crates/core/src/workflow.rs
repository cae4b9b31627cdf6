//! Workflow record and state machine (spec §3 "Workflow record"/"Workflow state").

use crate::id::{AgentId, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three states a workflow can occupy. `Completed`/`Failed` are
/// terminal; `Running` is not (spec §3 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkflowState {
    Running,
    Completed,
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One entry in a workflow's append-only state history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTransition {
    pub state: WorkflowState,
    pub at: DateTime<Utc>,
    pub reason: Option<String>,
}

/// One accepted execution of a module on an agent (spec §3).
///
/// Invariants enforced here (spec §3 "Invariants"):
/// 1. the first history entry is always `Running` (by construction, see
///    [`Workflow::new`]);
/// 2. a terminal state is never overwritten ([`Workflow::transition`] is a
///    no-op once [`Workflow::current_state`] is terminal);
/// 3/4. per-agent RUNNING indexing is the caller's responsibility (the
///    engine, §4.6) — this type only tracks its own history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub agent_id: AgentId,
    pub module_name: String,
    pub request: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub history: Vec<WorkflowTransition>,
}

impl Workflow {
    /// Mint a new workflow in `RUNNING`, injecting `workflow_id` into the
    /// request payload (spec §4.6 step 3).
    pub fn new(agent_id: AgentId, module_name: impl Into<String>, request: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self::with_id(WorkflowId::new(), agent_id, module_name, request, now)
    }

    /// Like [`Workflow::new`] but with a caller-supplied ID instead of a
    /// freshly minted one. Used by the async execution path (spec §4.8
    /// `ExecuteModule(mode=async)`), which must hand the workflow_id back
    /// to the caller before validation runs against the agent's capability
    /// document.
    pub fn with_id(id: WorkflowId, agent_id: AgentId, module_name: impl Into<String>, mut request: serde_json::Value, now: DateTime<Utc>) -> Self {
        if let serde_json::Value::Object(map) = &mut request {
            map.insert("workflow_id".to_string(), serde_json::Value::String(id.to_string()));
        }
        Self {
            id,
            agent_id,
            module_name: module_name.into(),
            request,
            created_at: now,
            history: vec![WorkflowTransition { state: WorkflowState::Running, at: now, reason: None }],
        }
    }

    pub fn current_state(&self) -> WorkflowState {
        self.history
            .last()
            .map(|t| t.state)
            .unwrap_or(WorkflowState::Running)
    }

    /// Apply a transition. Returns `true` if it was applied, `false` if it
    /// was a no-op because the workflow is already terminal (spec §3
    /// invariant 2, spec §4.6 "Apply the transition (never regressing from
    /// a terminal state)").
    pub fn transition(&mut self, state: WorkflowState, at: DateTime<Utc>, reason: Option<String>) -> bool {
        if self.current_state().is_terminal() {
            return false;
        }
        self.history.push(WorkflowTransition { state, at, reason });
        true
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;

    pub fn sample_workflow(agent_id: AgentId, now: DateTime<Utc>) -> Workflow {
        Workflow::new(agent_id, "echo", serde_json::json!({"message": "hi"}), now)
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
