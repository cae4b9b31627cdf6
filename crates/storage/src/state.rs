//! Materialized state replayed from the write-ahead log (spec §4.7).
//!
//! Grounded on `crates/storage/src/state/mod.rs`'s "derive state from
//! events" shape, narrowed to the two tables spec §4.7 names: agents and
//! workflows (with their per-transition history folded into the
//! `Workflow` record itself, rather than a separate table, since
//! `fleet_core::Workflow` already carries its own history vector).

use fleet_core::{AgentId, AgentRecord, Workflow, WorkflowId, WorkflowTransition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One durable fact about the fleet, in append order. Replaying every
/// event from seq 0 reconstructs [`MaterializedState`] exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PersistenceEvent {
    AgentUpserted(AgentRecord),
    WorkflowCreated(Workflow),
    WorkflowTransitioned { workflow_id: WorkflowId, transition: WorkflowTransition },
}

/// In-memory projection of the agents and workflows tables (spec §4.7
/// "Persistence layout"). Hydrated once at startup by replaying the WAL,
/// then kept current by applying each event synchronously as it's
/// appended.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub agents: HashMap<AgentId, AgentRecord>,
    pub workflows: HashMap<WorkflowId, Workflow>,
}

impl MaterializedState {
    pub fn apply(&mut self, event: &PersistenceEvent) {
        match event {
            PersistenceEvent::AgentUpserted(record) => {
                self.agents.insert(record.id, record.clone());
            }
            PersistenceEvent::WorkflowCreated(workflow) => {
                self.workflows.insert(workflow.id, workflow.clone());
            }
            PersistenceEvent::WorkflowTransitioned { workflow_id, transition } => {
                if let Some(workflow) = self.workflows.get_mut(workflow_id) {
                    workflow.transition(transition.state, transition.at, transition.reason.clone());
                }
            }
        }
    }

    pub fn agent(&self, id: &AgentId) -> Option<&AgentRecord> {
        self.agents.get(id)
    }

    pub fn workflow(&self, id: &WorkflowId) -> Option<&Workflow> {
        self.workflows.get(id)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
