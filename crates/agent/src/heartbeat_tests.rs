use super::*;
use crate::registry::ModuleRegistry;
use fleet_bus::FakeBusClient;
use tempfile::tempdir;
use tokio::sync::oneshot;

fn emitter(bus: FakeBusClient) -> HeartbeatEmitter<FakeBusClient> {
    let modules_dir = tempdir().unwrap();
    let crash_dir = tempdir().unwrap();
    let host = Arc::new(ModuleHost::new(
        ModuleRegistry::with_builtins(),
        bus.clone(),
        AgentId::from_string("a1"),
        "agent-one".to_string(),
        modules_dir.path().to_path_buf(),
        crash_dir.path().to_path_buf(),
    ));
    HeartbeatEmitter::new(bus, host, AgentId::from_string("a1"), "agent-one".to_string(), "host-one".to_string(), Duration::from_millis(20), "America/Los_Angeles".to_string())
}

#[tokio::test]
async fn run_publishes_a_started_notification_and_at_least_one_heartbeat_before_shutdown() {
    let bus = FakeBusClient::new();
    let emitter = emitter(bus.clone());
    let (tx, rx) = oneshot::channel();

    let run = tokio::spawn(async move { emitter.run(rx).await });
    tokio::time::sleep(Duration::from_millis(60)).await;
    tx.send(()).unwrap();
    run.await.unwrap();

    let notifs = bus.published_to(fleet_bus::subject::NOTIF);
    assert!(notifs.len() >= 2);
    assert!(!bus.published_to(fleet_bus::subject::HEARTBEAT).is_empty());
}

#[tokio::test]
async fn build_document_embeds_the_agent_identity() {
    let bus = FakeBusClient::new();
    let emitter = emitter(bus);
    let document = emitter.build_document();
    assert_eq!(document.agent.id, "a1");
    assert_eq!(document.agent.name, "agent-one");
    assert_eq!(document.agent.timezone, vec!["America/Los_Angeles".to_string()]);
    assert_eq!(document.module, "heartbeat");
}
