use super::*;
use chrono::Duration as ChronoDuration;
use fleet_bus::FakeBusClient;
use fleet_core::test_support::sample_capabilities;
use fleet_core::AgentId;
use fleet_coordinator::{AgentRegistry, WorkflowEngine};
use fleet_storage::PersistencePort;
use fleet_wire::AgentFilter;
use parking_lot::Mutex;
use tempfile::tempdir;
use tokio::net::UnixStream;

fn api(state_dir: &Path) -> (Arc<ApiPort<FakeBusClient>>, AgentId) {
    let bus = FakeBusClient::new();
    let registry = AgentRegistry::new(ChronoDuration::seconds(6));
    let persistence = Arc::new(Mutex::new(PersistencePort::open(state_dir.join("fleet.wal")).unwrap()));
    let agent_id = AgentId::new();
    registry.record_heartbeat(agent_id, "agent-one".to_string(), "host-one".to_string(), sample_capabilities(&["echo"]), chrono::Utc::now());
    let engine = Arc::new(WorkflowEngine::new(bus, registry.clone(), persistence));
    (Arc::new(ApiPort::new(registry, engine)), agent_id)
}

#[tokio::test]
async fn serve_answers_a_list_agents_request_over_the_socket() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("control.sock");
    let (api_port, agent_id) = api(dir.path());

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let server_path = socket_path.clone();
    let server = tokio::spawn(async move { serve(&server_path, api_port, shutdown_rx).await });

    // Give the listener a moment to bind.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let mut client = UnixStream::connect(&socket_path).await.unwrap();
    fleet_wire::write_message(&mut client, &Request::ListAgents { filter: AgentFilter::All }).await.unwrap();
    let response: Response = fleet_wire::read_message(&mut client).await.unwrap().unwrap();

    match response {
        Response::Agents { agents } => {
            assert_eq!(agents.len(), 1);
            assert_eq!(agents[0].id, agent_id);
        }
        other => panic!("unexpected response: {other:?}"),
    }

    drop(client);
    let _ = shutdown_tx.send(());
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn serve_returns_an_error_response_for_an_unknown_workflow() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("control.sock");
    let (api_port, _agent_id) = api(dir.path());

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let server_path = socket_path.clone();
    let server = tokio::spawn(async move { serve(&server_path, api_port, shutdown_rx).await });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let mut client = UnixStream::connect(&socket_path).await.unwrap();
    let workflow_id = fleet_core::WorkflowId::new();
    fleet_wire::write_message(&mut client, &Request::CancelWorkflow { workflow_id }).await.unwrap();
    let response: Response = fleet_wire::read_message(&mut client).await.unwrap().unwrap();

    assert!(matches!(response, Response::Error { .. }));

    drop(client);
    let _ = shutdown_tx.send(());
    server.await.unwrap().unwrap();
}
