//! `fleet-agentd`: the agent-process composition root (spec §4.2-§4.3).
//! Loads config, connects the bus, wires the Module Host and Heartbeat
//! Emitter, and shuts both down cleanly on SIGTERM/SIGINT.

use fleet_agent::config::AgentConfig;
use fleet_agent::heartbeat::HeartbeatEmitter;
use fleet_agent::host::ModuleHost;
use fleet_agent::registry::ModuleRegistry;
use fleet_agent::watcher::ModuleWatcher;
use fleet_bus::{BusClient, NatsBusClient, ReconnectPolicy};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = AgentConfig::from_env()?;
    tracing::info!(agent_id = %config.agent_id, agent_name = %config.agent_name, "starting fleet-agentd");

    let bus = NatsBusClient::connect(&config.nats_servers.join(","), &config.agent_name, ReconnectPolicy::default()).await?;

    tokio::fs::create_dir_all(&config.modules_dir).await.ok();
    tokio::fs::create_dir_all(&config.crash_dir()).await.ok();

    let host = Arc::new(ModuleHost::new(
        ModuleRegistry::with_builtins(),
        bus.clone(),
        config.agent_id,
        config.agent_name.clone(),
        config.modules_dir.clone(),
        config.crash_dir(),
    ));
    host.load_all().await?;

    let emitter = HeartbeatEmitter::new(bus.clone(), Arc::clone(&host), config.agent_id, config.agent_name.clone(), config.hostname.clone(), config.heartbeat_interval, config.timezone.clone());
    let (heartbeat_shutdown_tx, heartbeat_shutdown_rx) = tokio::sync::oneshot::channel();
    let heartbeat_task = tokio::spawn(async move { emitter.run(heartbeat_shutdown_rx).await });

    let mut watcher = ModuleWatcher::watch(&config.modules_dir)?;
    let watch_host = Arc::clone(&host);
    let watcher_task = tokio::spawn(async move {
        while let Some(path) = watcher.next_change().await {
            watch_host.reload_from_path(&path).await;
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    let _ = heartbeat_shutdown_tx.send(());
    let _ = heartbeat_task.await;
    watcher_task.abort();
    host.stop_all().await;
    bus.drain().await?;

    Ok(())
}
