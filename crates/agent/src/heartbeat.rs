//! The Heartbeat Emitter (C3, spec §4.3). Grounded on
//! `original_source/modules/heartbeat/worker.py`'s `HeartbeatModule`:
//! fixed-interval loop publishing a self-describing document, with a final
//! "stopped" notification on cancellation.

use crate::host::ModuleHost;
use crate::probes;
use fleet_bus::BusClient;
use fleet_core::AgentId;
use fleet_wire::{AgentBlock, HeartbeatDocument, Probe};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub struct HeartbeatEmitter<B: BusClient> {
    bus: B,
    host: Arc<ModuleHost<B>>,
    agent_id: AgentId,
    agent_name: String,
    hostname: String,
    interval: Duration,
    timezone: String,
    tags: BTreeMap<String, String>,
}

impl<B: BusClient + Clone + 'static> HeartbeatEmitter<B> {
    pub fn new(bus: B, host: Arc<ModuleHost<B>>, agent_id: AgentId, agent_name: String, hostname: String, interval: Duration, timezone: String) -> Self {
        Self { bus, host, agent_id, agent_name, hostname, interval, timezone, tags: BTreeMap::new() }
    }

    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    fn build_document(&self) -> HeartbeatDocument {
        HeartbeatDocument {
            module: "heartbeat".to_string(),
            timestamp: chrono::Utc::now(),
            tags: self.tags.clone(),
            agent: AgentBlock {
                id: self.agent_id.to_string(),
                name: self.agent_name.clone(),
                hostname: self.hostname.clone(),
                pid: std::process::id(),
                timezone: vec![self.timezone.clone()],
                user: Probe::from_result(probes::probe_user()),
                system: Probe::from_result(probes::probe_system()),
                network: Probe::from_result(probes::probe_network()),
                modules: self.host.capabilities(),
            },
        }
    }

    async fn send(&self) {
        let document = self.build_document();
        match serde_json::to_vec(&document) {
            Ok(bytes) => {
                if let Err(error) = self.bus.publish(fleet_bus::subject::HEARTBEAT, bytes).await {
                    tracing::warn!(%error, "failed to publish heartbeat");
                }
            }
            Err(error) => tracing::warn!(%error, "failed to serialize heartbeat document"),
        }
    }

    /// Runs until `shutdown` resolves, sending one heartbeat per tick and a
    /// final notification on the way out (spec §4.3, `worker.py`'s
    /// `CancelledError` branch).
    pub async fn run(&self, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
        publish_notif(&self.bus, "Started module", "heartbeat").await;
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.send().await,
                _ = &mut shutdown => break,
            }
        }
        publish_notif(&self.bus, "Stopped module", "heartbeat").await;
    }
}

async fn publish_notif<B: BusClient>(bus: &B, message: &str, name: &str) {
    let payload = serde_json::json!({"message": message, "name": name});
    if let Ok(bytes) = serde_json::to_vec(&payload) {
        let _ = bus.publish(fleet_bus::subject::NOTIF, bytes).await;
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
