use super::*;
use fleet_bus::FakeBusClient;
use fleet_core::AgentId;

fn seen() -> Arc<Mutex<HashSet<String>>> {
    Arc::new(Mutex::new(HashSet::new()))
}

#[tokio::test]
async fn handle_echoes_the_input_back_with_from_module_and_processed_at() {
    let bus = FakeBusClient::new();
    handle(bus.clone(), AgentId::from_string("a1"), br#"{"message":"hi","id":"m1"}"#, "out".to_string(), "err".to_string(), seen()).await;

    let published = bus.published_to("out");
    assert_eq!(published.len(), 1);
    let value: serde_json::Value = serde_json::from_slice(&published[0]).unwrap();
    assert_eq!(value["from_module"], "faulty");
    assert!(value["processed_at"].is_string());
}

#[tokio::test]
async fn handle_reports_failed_and_publishes_to_error_subject_on_crash() {
    let bus = FakeBusClient::new();
    handle(bus.clone(), AgentId::from_string("a1"), br#"{"message":"hi","crash":true}"#, "out".to_string(), "err".to_string(), seen()).await;

    assert_eq!(bus.published_to("out").len(), 0);
    assert_eq!(bus.published_to("err").len(), 1);
    let states = bus.published_to(fleet_bus::subject::MODULE_STATE);
    let decoded: Vec<fleet_wire::StateMessage> = states.iter().map(|bytes| serde_json::from_slice(bytes).unwrap()).collect();
    assert!(decoded.iter().any(|m| m.state == fleet_wire::WireModuleState::Failed));
}

#[tokio::test]
async fn handle_drops_a_duplicate_message_id_without_republishing() {
    let bus = FakeBusClient::new();
    let processed_ids = seen();
    handle(bus.clone(), AgentId::from_string("a1"), br#"{"message":"hi","id":"dup"}"#, "out".to_string(), "err".to_string(), Arc::clone(&processed_ids)).await;
    handle(bus.clone(), AgentId::from_string("a1"), br#"{"message":"hi","id":"dup"}"#, "out".to_string(), "err".to_string(), processed_ids).await;

    assert_eq!(bus.published_to("out").len(), 1);
}

#[tokio::test]
async fn run_subscribes_on_the_input_subject() {
    let bus = FakeBusClient::new();
    let ctx = ModuleContext::new(AgentId::from_string("a1"), "agent-one".to_string(), bus.clone(), "faulty");
    let input_subject = ctx.input_subject.clone();
    let mut module = FaultyModule::default();
    module.run(ctx).await.unwrap();
    assert_eq!(bus.subscriber_count(&input_subject), 1);
}
