//! `fleetd`: the coordinator-process composition root (spec §4.4-§4.8).
//! Opens the persistence port, hydrates the registry and workflow engine
//! from it, starts the bus-side ingest pipeline and liveness sweeper, and
//! serves the control socket until SIGTERM/SIGINT.

use fleet_bus::{BusClient, NatsBusClient, ReconnectPolicy};
use fleet_coordinator::{AgentRegistry, ApiPort, SubscriptionManager, WorkflowEngine};
use fleet_daemon::config::DaemonConfig;
use fleet_daemon::ingest::Ingest;
use fleet_storage::PersistencePort;
use parking_lot::Mutex;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = DaemonConfig::from_env()?;
    tracing::info!(state_dir = %config.state_dir.display(), "starting fleetd");

    tokio::fs::create_dir_all(&config.state_dir).await.ok();
    let persistence = Arc::new(Mutex::new(PersistencePort::open(config.wal_path())?));

    let registry = {
        let guard = persistence.lock();
        AgentRegistry::from_records(guard.state().agents.values().cloned(), config.heartbeat_timeout)
    };

    let bus = NatsBusClient::connect(&config.nats_servers.join(","), "fleetd", ReconnectPolicy::default()).await?;

    let engine = Arc::new(WorkflowEngine::new(bus.clone(), registry.clone(), Arc::clone(&persistence)));
    {
        let guard = persistence.lock();
        engine.hydrate(guard.state().workflows.values().cloned());
    }

    let subscriptions = SubscriptionManager::new(bus.clone());
    let ingest = Arc::new(Ingest::new(bus.clone(), registry.clone(), Arc::clone(&persistence), subscriptions, Arc::clone(&engine)));
    ingest.start().await?;
    let sweeper = ingest.spawn_sweeper(config.liveness_sweep_interval);

    let api = Arc::new(ApiPort::new(registry, engine));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let control_socket = config.control_socket.clone();
    let listener_task = tokio::spawn(async move { fleet_daemon::listener::serve(&control_socket, api, shutdown_rx).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    let _ = shutdown_tx.send(());
    listener_task.await??;
    sweeper.abort();
    bus.drain().await?;

    Ok(())
}
