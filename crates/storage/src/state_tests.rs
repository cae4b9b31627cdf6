use super::*;
use chrono::Utc;
use fleet_core::test_support::sample_workflow;
use fleet_core::{AgentId, WorkflowState};

fn agent(now: chrono::DateTime<Utc>) -> AgentRecord {
    fleet_core::test_support::sample_agent(AgentId::new(), now)
}

#[test]
fn replaying_agent_upsert_populates_the_agents_table() {
    let mut state = MaterializedState::default();
    let record = agent(Utc::now());
    state.apply(&PersistenceEvent::AgentUpserted(record.clone()));

    assert_eq!(state.agent(&record.id).unwrap().name, record.name);
}

#[test]
fn second_upsert_replaces_rather_than_duplicates() {
    let mut state = MaterializedState::default();
    let mut record = agent(Utc::now());
    state.apply(&PersistenceEvent::AgentUpserted(record.clone()));

    record.heartbeat_count = 9;
    state.apply(&PersistenceEvent::AgentUpserted(record.clone()));

    assert_eq!(state.agents.len(), 1);
    assert_eq!(state.agent(&record.id).unwrap().heartbeat_count, 9);
}

#[test]
fn workflow_created_then_transitioned_updates_state() {
    let mut state = MaterializedState::default();
    let now = Utc::now();
    let workflow = sample_workflow(agent(now).id, now);
    let id = workflow.id;
    state.apply(&PersistenceEvent::WorkflowCreated(workflow));

    assert_eq!(state.workflow(&id).unwrap().current_state(), WorkflowState::Running);

    state.apply(&PersistenceEvent::WorkflowTransitioned {
        workflow_id: id,
        transition: fleet_core::WorkflowTransition { state: WorkflowState::Completed, at: now, reason: None },
    });

    assert_eq!(state.workflow(&id).unwrap().current_state(), WorkflowState::Completed);
}

#[test]
fn transition_on_unknown_workflow_is_ignored() {
    let mut state = MaterializedState::default();
    state.apply(&PersistenceEvent::WorkflowTransitioned {
        workflow_id: fleet_core::WorkflowId::new(),
        transition: fleet_core::WorkflowTransition { state: WorkflowState::Failed, at: Utc::now(), reason: None },
    });
    assert!(state.workflows.is_empty());
}
