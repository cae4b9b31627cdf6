//! Subscription Manager (C5, spec §4.5): keeps exactly one tracked set of
//! subscriptions per agent, installing the common result handler on each.
//!
//! Grounded directly on `original_source/server/subscription_manager.py`'s
//! `SubscriptionManager`: `active_subscriptions: Dict[agent_id, Set[topic]]`,
//! forget-then-resubscribe on repeat calls (the bus has no `unsubscribe`,
//! so "idempotent" means "the tracked set doesn't grow unboundedly", not
//! that duplicate subscriptions never happen on the wire).

use fleet_bus::{BusClient, BusError, Handler};
use fleet_core::{AgentId, CapabilityDocument};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Retry policy for subscription setup (spec §4.5 "up to 5 attempts,
/// exponential backoff factor 2").
const MAX_ATTEMPTS: u32 = 5;
const INITIAL_DELAY: Duration = Duration::from_millis(100);
const BACKOFF_FACTOR: u32 = 2;

fn delay_for(attempt: u32) -> Duration {
    INITIAL_DELAY * BACKOFF_FACTOR.saturating_pow(attempt.min(16))
}

/// The subject set spec §4.5 names for one agent: the catch-all
/// `agent.<id>.out` plus every module's `output_subject`.
pub fn target_subjects(agent_id: &AgentId, capabilities: &CapabilityDocument) -> HashSet<String> {
    let mut subjects: HashSet<String> = capabilities.output_subjects().map(str::to_string).collect();
    subjects.insert(format!("agent.{agent_id}.out"));
    subjects
}

/// Coordinator-side map of `agent_id -> set(subject)` the coordinator has
/// opened subscriptions for (spec §4.5).
pub struct SubscriptionManager<B: BusClient> {
    bus: B,
    active: Arc<Mutex<HashMap<AgentId, HashSet<String>>>>,
}

impl<B: BusClient> Clone for SubscriptionManager<B> {
    fn clone(&self) -> Self {
        Self { bus: self.bus.clone(), active: Arc::clone(&self.active) }
    }
}

impl<B: BusClient> SubscriptionManager<B> {
    pub fn new(bus: B) -> Self {
        Self { bus, active: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn tracked_subjects(&self, agent_id: &AgentId) -> HashSet<String> {
        self.active.lock().get(agent_id).cloned().unwrap_or_default()
    }

    /// Forget any previously tracked subjects and subscribe to the current
    /// target set, installing `handler` on each (spec §4.5 "idempotent:
    /// previously-tracked subjects are forgotten"). Retries the whole
    /// operation up to [`MAX_ATTEMPTS`] times; succeeds only once every
    /// target subject has subscribed without error.
    pub async fn setup_for_agent(
        &self,
        agent_id: AgentId,
        capabilities: &CapabilityDocument,
        handler: Handler,
    ) -> Result<HashSet<String>, BusError> {
        self.active.lock().remove(&agent_id);
        let targets = target_subjects(&agent_id, capabilities);

        let mut attempt = 0;
        loop {
            match self.try_subscribe_all(&targets, handler.clone()).await {
                Ok(()) => {
                    self.active.lock().insert(agent_id, targets.clone());
                    tracing::info!(agent_id = %agent_id, subjects = ?targets, "subscribed to agent");
                    return Ok(targets);
                }
                Err(err) if attempt + 1 >= MAX_ATTEMPTS => return Err(err),
                Err(err) => {
                    tracing::warn!(agent_id = %agent_id, attempt, error = %err, "subscription setup failed, retrying");
                    tokio::time::sleep(delay_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn try_subscribe_all(&self, targets: &HashSet<String>, handler: Handler) -> Result<(), BusError> {
        for subject in targets {
            self.bus.subscribe(subject, Arc::clone(&handler)).await?;
        }
        Ok(())
    }

    pub fn forget_agent(&self, agent_id: &AgentId) {
        self.active.lock().remove(agent_id);
    }
}

#[cfg(test)]
#[path = "subscriptions_tests.rs"]
mod tests;
