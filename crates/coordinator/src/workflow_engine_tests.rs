use super::*;
use crate::registry::{AgentRegistry, DEFAULT_HEARTBEAT_TIMEOUT};
use fleet_bus::FakeBusClient;
use fleet_core::test_support::sample_capabilities;
use tempfile::tempdir;

fn engine_with_agent(bus: FakeBusClient) -> (WorkflowEngine<FakeBusClient>, AgentRegistry, AgentId, chrono::DateTime<chrono::Utc>, tempfile::TempDir) {
    let registry = AgentRegistry::new(DEFAULT_HEARTBEAT_TIMEOUT);
    let agent_id = AgentId::new();
    let now = chrono::Utc::now();
    registry.record_heartbeat(agent_id, "a1".into(), "host".into(), sample_capabilities(&["echo"]), now);

    let dir = tempdir().unwrap();
    let persistence = Arc::new(Mutex::new(PersistencePort::open(dir.path().join("fleet.wal")).unwrap()));
    let engine = WorkflowEngine::new(bus, registry.clone(), persistence);
    (engine, registry, agent_id, now, dir)
}

#[tokio::test]
async fn happy_path_completes_through_running_then_completed() {
    let bus = FakeBusClient::new();
    let (engine, _registry, agent_id, now, _dir) = engine_with_agent(bus.clone());

    let workflow_id = engine.execute_module(agent_id, "echo", serde_json::json!({"message": "hi"}), now).await.unwrap();

    let workflow = engine.get(&workflow_id).unwrap();
    assert_eq!(workflow.current_state(), WorkflowState::Running);
    assert_eq!(bus.published_to("agent.a1.echo.in").len(), 1);

    let result = serde_json::json!({"workflow_id": workflow_id.to_string(), "success": true}).to_string();
    engine.handle_result(result.as_bytes(), now);

    let workflow = engine.get(&workflow_id).unwrap();
    assert_eq!(workflow.current_state(), WorkflowState::Completed);
    let states: Vec<_> = workflow.history.iter().map(|t| t.state).collect();
    assert_eq!(states, vec![WorkflowState::Running, WorkflowState::Completed]);
}

#[tokio::test]
async fn schema_rejection_creates_no_workflow_and_publishes_nothing() {
    let bus = FakeBusClient::new();
    let (engine, _registry, agent_id, now, _dir) = engine_with_agent(bus.clone());

    let err = engine.execute_module(agent_id, "echo", serde_json::json!({}), now).await.unwrap_err();

    assert!(matches!(err, FleetError::SchemaRejected { .. }));
    assert!(engine.list(None, 1000).is_empty());
    assert!(bus.published_to("agent.a1.echo.in").is_empty());
}

#[tokio::test]
async fn unknown_agent_is_rejected() {
    let bus = FakeBusClient::new();
    let registry = AgentRegistry::new(DEFAULT_HEARTBEAT_TIMEOUT);
    let dir = tempdir().unwrap();
    let persistence = Arc::new(Mutex::new(PersistencePort::open(dir.path().join("fleet.wal")).unwrap()));
    let engine = WorkflowEngine::new(bus, registry, persistence);

    let err = engine.execute_module(AgentId::new(), "echo", serde_json::json!({"message": "hi"}), chrono::Utc::now()).await.unwrap_err();

    assert!(matches!(err, FleetError::AgentUnavailable(_)));
}

#[tokio::test]
async fn unknown_module_is_rejected() {
    let bus = FakeBusClient::new();
    let (engine, _registry, agent_id, now, _dir) = engine_with_agent(bus);

    let err = engine.execute_module(agent_id, "nonexistent", serde_json::json!({}), now).await.unwrap_err();

    assert!(matches!(err, FleetError::ModuleUnknown { .. }));
}

#[tokio::test]
async fn dead_agent_sweep_fails_orphaned_running_workflows() {
    let bus = FakeBusClient::new();
    let (engine, registry, agent_id, now, _dir) = engine_with_agent(bus);
    let workflow_id = engine.execute_module(agent_id, "echo", serde_json::json!({"message": "hi"}), now).await.unwrap();

    registry.sweep_liveness(now + chrono::Duration::hours(1));
    let failed = engine.sweep_dead_agents(now + chrono::Duration::hours(1));

    assert_eq!(failed, vec![workflow_id]);
    let workflow = engine.get(&workflow_id).unwrap();
    assert_eq!(workflow.current_state(), WorkflowState::Failed);
    assert_eq!(workflow.history.last().unwrap().reason.as_deref(), Some("agent died"));

    // second sweep is a no-op: already terminal, removed from the index.
    let again = engine.sweep_dead_agents(now + chrono::Duration::hours(2));
    assert!(again.is_empty());
}

#[tokio::test]
async fn cancel_transitions_non_terminal_workflow_to_failed() {
    let bus = FakeBusClient::new();
    let (engine, _registry, agent_id, now, _dir) = engine_with_agent(bus);
    let workflow_id = engine.execute_module(agent_id, "echo", serde_json::json!({"message": "hi"}), now).await.unwrap();

    let state = engine.cancel(workflow_id, now).unwrap();

    assert_eq!(state, WorkflowState::Failed);
    assert_eq!(engine.get(&workflow_id).unwrap().history.last().unwrap().reason.as_deref(), Some("cancelled"));
}

#[tokio::test]
async fn cancel_on_terminal_workflow_is_a_no_op() {
    let bus = FakeBusClient::new();
    let (engine, _registry, agent_id, now, _dir) = engine_with_agent(bus);
    let workflow_id = engine.execute_module(agent_id, "echo", serde_json::json!({"message": "hi"}), now).await.unwrap();
    engine.cancel(workflow_id, now).unwrap();

    let state = engine.cancel(workflow_id, now).unwrap();

    assert_eq!(state, WorkflowState::Failed);
    assert_eq!(engine.get(&workflow_id).unwrap().history.len(), 2);
}

#[tokio::test]
async fn cancel_unknown_workflow_is_not_found() {
    let bus = FakeBusClient::new();
    let (engine, ..) = engine_with_agent(bus);

    let err = engine.cancel(WorkflowId::new(), chrono::Utc::now()).unwrap_err();

    assert!(matches!(err, FleetError::WorkflowNotFound(_)));
}

#[tokio::test]
async fn result_with_no_workflow_id_is_discarded_silently() {
    let bus = FakeBusClient::new();
    let (engine, ..) = engine_with_agent(bus);

    engine.handle_result(br#"{"success": true}"#, chrono::Utc::now());
    // no panic, nothing to assert beyond "did not crash": an untracked
    // result has no workflow to observe.
}

#[tokio::test]
async fn result_for_unknown_workflow_is_discarded() {
    let bus = FakeBusClient::new();
    let (engine, ..) = engine_with_agent(bus);
    let fake_id = WorkflowId::new();

    let payload = serde_json::json!({"workflow_id": fake_id.to_string(), "success": true}).to_string();
    engine.handle_result(payload.as_bytes(), chrono::Utc::now());

    assert!(engine.get(&fake_id).is_none());
}

#[tokio::test]
async fn result_after_cancel_does_not_change_state() {
    let bus = FakeBusClient::new();
    let (engine, _registry, agent_id, now, _dir) = engine_with_agent(bus);
    let workflow_id = engine.execute_module(agent_id, "echo", serde_json::json!({"message": "hi"}), now).await.unwrap();
    engine.cancel(workflow_id, now).unwrap();

    let payload = serde_json::json!({"workflow_id": workflow_id.to_string(), "success": true}).to_string();
    engine.handle_result(payload.as_bytes(), now);

    let workflow = engine.get(&workflow_id).unwrap();
    assert_eq!(workflow.current_state(), WorkflowState::Failed);
    assert_eq!(workflow.history.last().unwrap().reason.as_deref(), Some("cancelled"));
}

#[tokio::test]
async fn agent_state_message_maps_to_domain_transitions() {
    let bus = FakeBusClient::new();
    let (engine, _registry, agent_id, now, _dir) = engine_with_agent(bus);
    let workflow_id = engine.execute_module(agent_id, "echo", serde_json::json!({"message": "hi"}), now).await.unwrap();

    let message = fleet_wire::StateMessage {
        agent_id,
        module_name: "echo".into(),
        state: fleet_wire::WireModuleState::Completed,
        workflow_id: Some(workflow_id),
        error_message: None,
        details: None,
    };
    engine.handle_agent_state(&message, now);

    assert_eq!(engine.get(&workflow_id).unwrap().current_state(), WorkflowState::Completed);
}

#[tokio::test]
async fn reserved_execution_dispatches_under_the_pre_minted_id() {
    let bus = FakeBusClient::new();
    let (engine, _registry, agent_id, now, _dir) = engine_with_agent(bus.clone());
    let workflow_id = WorkflowId::new();

    engine.execute_module_reserved(workflow_id, agent_id, "echo", serde_json::json!({"message": "hi"}), now).await;

    let workflow = engine.get(&workflow_id).unwrap();
    assert_eq!(workflow.id, workflow_id);
    assert_eq!(workflow.current_state(), WorkflowState::Running);
    assert_eq!(bus.published_to("agent.a1.echo.in").len(), 1);
}

#[tokio::test]
async fn reserved_execution_validation_failure_still_resolves_to_a_failed_record() {
    let bus = FakeBusClient::new();
    let (engine, _registry, agent_id, now, _dir) = engine_with_agent(bus);
    let workflow_id = WorkflowId::new();

    engine.execute_module_reserved(workflow_id, agent_id, "echo", serde_json::json!({}), now).await;

    let workflow = engine.get(&workflow_id).unwrap();
    assert_eq!(workflow.current_state(), WorkflowState::Failed);
}

#[test]
fn hydrate_reindexes_running_workflows_for_the_death_sweep() {
    let bus = FakeBusClient::new();
    let registry = AgentRegistry::new(DEFAULT_HEARTBEAT_TIMEOUT);
    let dir = tempdir().unwrap();
    let persistence = Arc::new(Mutex::new(PersistencePort::open(dir.path().join("fleet.wal")).unwrap()));
    let engine = WorkflowEngine::new(bus, registry, persistence);

    let agent_id = AgentId::new();
    let now = chrono::Utc::now();
    let workflow = Workflow::new(agent_id, "echo", serde_json::json!({"message": "hi"}), now);
    let workflow_id = workflow.id;
    engine.hydrate(vec![workflow]);

    let failed = engine.sweep_dead_agents(now);
    assert_eq!(failed, vec![workflow_id]);
}
