//! Bus-side ingest pipeline: the glue between `fleet-bus` subjects and the
//! coordinator's registry/subscriptions/workflow engine.
//!
//! Grounded on `listener/mod.rs`'s pattern of a shared `Arc<Ctx>` handed to
//! every spawned task, narrowed here to three standing subscriptions
//! (heartbeat, module-state, and per-agent result routing) plus a
//! periodic liveness sweep — the bus-driven analogue of
//! `lifecycle/reconcile.rs`'s sweep-on-interval idiom.

use chrono::Utc;
use fleet_bus::{BusClient, BusError, Handler};
use fleet_core::AgentId;
use fleet_coordinator::{AgentRegistry, SubscriptionManager, WorkflowEngine};
use fleet_storage::PersistencePort;
use fleet_wire::{HeartbeatDocument, StateMessage};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub struct Ingest<B: BusClient> {
    bus: B,
    registry: AgentRegistry,
    persistence: Arc<Mutex<PersistencePort>>,
    subscriptions: SubscriptionManager<B>,
    engine: Arc<WorkflowEngine<B>>,
}

impl<B: BusClient> Clone for Ingest<B> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus.clone(),
            registry: self.registry.clone(),
            persistence: Arc::clone(&self.persistence),
            subscriptions: self.subscriptions.clone(),
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<B: BusClient> Ingest<B> {
    pub fn new(bus: B, registry: AgentRegistry, persistence: Arc<Mutex<PersistencePort>>, subscriptions: SubscriptionManager<B>, engine: Arc<WorkflowEngine<B>>) -> Self {
        Self { bus, registry, persistence, subscriptions, engine }
    }

    /// Opens the two standing subscriptions (spec §4.4 "consumes
    /// heartbeats", spec §4.6 "Agent-state handler"). Per-agent result
    /// subscriptions are opened lazily, the first time a heartbeat reveals
    /// a new or changed capability set (spec §4.5).
    pub async fn start(&self) -> Result<(), BusError> {
        self.subscribe_heartbeat().await?;
        self.subscribe_module_state().await?;
        Ok(())
    }

    async fn subscribe_heartbeat(&self) -> Result<(), BusError> {
        let this = self.clone();
        let handler: Handler = Arc::new(move |_subject, payload| {
            let this = this.clone();
            tokio::spawn(async move { this.on_heartbeat(&payload).await });
        });
        self.bus.subscribe(fleet_bus::subject::HEARTBEAT, handler).await?;
        Ok(())
    }

    async fn subscribe_module_state(&self) -> Result<(), BusError> {
        let engine = Arc::clone(&self.engine);
        let handler: Handler = Arc::new(move |_subject, payload| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                match serde_json::from_slice::<StateMessage>(&payload) {
                    Ok(message) => engine.handle_agent_state(&message, Utc::now()),
                    Err(error) => tracing::debug!(%error, "discarding malformed state message"),
                }
            });
        });
        self.bus.subscribe(fleet_bus::subject::MODULE_STATE, handler).await?;
        Ok(())
    }

    async fn on_heartbeat(&self, payload: &[u8]) {
        let document: HeartbeatDocument = match serde_json::from_slice(payload) {
            Ok(doc) => doc,
            Err(error) => {
                tracing::debug!(%error, "discarding malformed heartbeat");
                return;
            }
        };
        let agent_id = AgentId::from_string(&document.agent.id);
        let now = Utc::now();
        let (record, outcome) = self.registry.record_heartbeat(agent_id, document.agent.name.clone(), document.agent.hostname.clone(), document.agent.modules.clone(), now);

        if let Err(error) = self.persistence.lock().upsert_agent(record.clone()) {
            tracing::warn!(%agent_id, %error, "failed to persist agent record");
        }

        if outcome.needs_resubscribe() {
            tracing::info!(%agent_id, ?outcome, "agent capabilities changed, resubscribing");
            let engine = Arc::clone(&self.engine);
            let handler: Handler = Arc::new(move |_subject, payload| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.handle_result(&payload, Utc::now()) });
            });
            if let Err(error) = self.subscriptions.setup_for_agent(agent_id, &record.capabilities, handler).await {
                tracing::warn!(%agent_id, %error, "subscription setup failed");
            }
        }
    }

    /// Spawns the liveness sweeper (spec §4.4 "background sweeper") and,
    /// on every agent it flips dead, the workflow death-sweep (spec §4.4
    /// last sentence, spec §4.6 "Agent-death sweeper"). The timeout itself
    /// lives inside `AgentRegistry`, set once at construction; this only
    /// controls how often the sweep runs.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let now = Utc::now();
                let flipped = this.registry.sweep_liveness(now);
                for agent_id in &flipped {
                    if let Some(record) = this.registry.get(agent_id) {
                        if let Err(error) = this.persistence.lock().upsert_agent(record) {
                            tracing::warn!(%agent_id, %error, "failed to persist liveness flip");
                        }
                    }
                    this.subscriptions.forget_agent(agent_id);
                    tracing::warn!(%agent_id, "agent timed out, marked dead");
                }
                // Unconditional, not gated on `flipped`: a crash between
                // persisting a liveness flip and persisting the resulting
                // workflow failure can leave a dead agent on disk with a
                // RUNNING workflow still attached, and that agent will
                // never flip again on a later tick. Idempotent to call
                // every tick regardless.
                let failed = this.engine.sweep_dead_agents(now);
                if !failed.is_empty() {
                    tracing::warn!(count = failed.len(), "workflows failed from dead agents");
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
