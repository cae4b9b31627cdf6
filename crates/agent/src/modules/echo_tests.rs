use super::*;
use fleet_bus::FakeBusClient;
use fleet_core::AgentId;

fn context(bus: FakeBusClient) -> ModuleContext<FakeBusClient> {
    ModuleContext::new(AgentId::from_string("a1"), "agent-one".to_string(), bus, "echo")
}

#[tokio::test]
async fn run_subscribes_on_the_input_subject() {
    let bus = FakeBusClient::new();
    let ctx = context(bus.clone());
    let input_subject = ctx.input_subject.clone();
    let mut module = EchoModule;
    module.run(ctx).await.unwrap();
    assert_eq!(bus.subscriber_count(&input_subject), 1);
}

#[tokio::test]
async fn handle_echoes_with_processed_at_and_from_module_fields() {
    let bus = FakeBusClient::new();
    handle(bus.clone(), AgentId::from_string("a1"), br#"{"message":"hi"}"#, "out".to_string(), "err".to_string()).await;

    let published = bus.published_to("out");
    assert_eq!(published.len(), 1);
    let value: serde_json::Value = serde_json::from_slice(&published[0]).unwrap();
    assert_eq!(value["message"], "hi");
    assert_eq!(value["from_module"], "echo");
    assert!(value["processed_at"].is_string());
}

#[tokio::test]
async fn handle_reports_malformed_payloads_on_the_error_subject() {
    let bus = FakeBusClient::new();
    handle(bus.clone(), AgentId::from_string("a1"), b"not json", "out".to_string(), "err".to_string()).await;
    assert_eq!(bus.published_to("out").len(), 0);
    assert_eq!(bus.published_to("err").len(), 1);
}

#[tokio::test]
async fn handle_reports_completed_state_after_a_successful_echo() {
    let bus = FakeBusClient::new();
    handle(
        bus.clone(),
        AgentId::from_string("a1"),
        br#"{"message":"hi","workflow_id":"wf-1"}"#,
        "out".to_string(),
        "err".to_string(),
    )
    .await;

    let states = bus.published_to(fleet_bus::subject::MODULE_STATE);
    let decoded: Vec<fleet_wire::StateMessage> = states.iter().map(|bytes| serde_json::from_slice(bytes).unwrap()).collect();
    assert!(decoded.iter().any(|m| m.state == fleet_wire::WireModuleState::Running));
    assert!(decoded.iter().any(|m| m.state == fleet_wire::WireModuleState::Completed));
}
