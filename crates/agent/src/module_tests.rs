use super::*;
use fleet_bus::FakeBusClient;

#[test]
fn context_subjects_follow_the_per_agent_per_module_layout() {
    let agent_id = AgentId::new();
    let ctx = ModuleContext::new(agent_id, "a1".into(), FakeBusClient::new(), "echo");

    assert_eq!(ctx.input_subject, format!("agent.{agent_id}.echo.in"));
    assert_eq!(ctx.output_subject, format!("agent.{agent_id}.echo.out"));
    assert_eq!(ctx.error_subject, format!("agent.{agent_id}.echo.error"));
}

#[test]
fn extract_workflow_id_reads_the_injected_field() {
    let payload = serde_json::json!({"workflow_id": "wfl-abc", "message": "hi"});
    assert_eq!(extract_workflow_id(&payload).unwrap().as_str(), "wfl-abc");
}

#[test]
fn extract_workflow_id_is_none_when_absent() {
    assert!(extract_workflow_id(&serde_json::json!({"message": "hi"})).is_none());
}

#[tokio::test]
async fn report_state_publishes_on_the_canonical_state_subject() {
    let bus = FakeBusClient::new();
    let agent_id = AgentId::new();
    report_state(&bus, agent_id, "echo", ReportedState::Running, None, None, None).await;

    let published = bus.published_to(fleet_bus::subject::MODULE_STATE);
    assert_eq!(published.len(), 1);
    let message: fleet_wire::StateMessage = serde_json::from_slice(&published[0]).unwrap();
    assert_eq!(message.state, fleet_wire::WireModuleState::Running);
    assert_eq!(message.module_name, "echo");
}
