//! Agent Registry (C4, spec §4.4): consumes heartbeats, maintains agent
//! liveness, and decides when a subscription (re)setup is owed.
//!
//! Grounded on `crates/core/src/agent_record.rs`'s status-enum shape and
//! `crates/daemon/src/lifecycle/reconcile.rs`'s sweep-on-interval idiom
//! (periodic pass over a shared map, transitioning stale entries).

use chrono::{DateTime, Duration, Utc};
use fleet_core::{AgentId, AgentRecord, CapabilityDocument};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Default `HEARTBEAT_TIMEOUT`: 2x the default heartbeat interval (spec
/// §4.4 "default 2x interval", spec §4.3 "default 2-5s").
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::seconds(6);

/// Outcome of ingesting one heartbeat, telling the caller whether a
/// subscription (re)setup is owed for this agent (spec §4.4 steps 2/4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    /// First heartbeat from this agent ID: a brand new record was created.
    NewAgent,
    /// An existing record's capability document changed.
    CapabilitiesChanged,
    /// An existing record's capability document is unchanged; only
    /// liveness bookkeeping advanced.
    Unchanged,
}

impl HeartbeatOutcome {
    /// Spec §4.4: "trigger a subscription setup workflow" fires on both a
    /// brand new agent and a capability change, never on a plain repeat.
    pub fn needs_resubscribe(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Coordinator-side map of `agent_id -> AgentRecord` (spec §3 "Ownership":
/// owned exclusively by the registry). Single writer in practice (the
/// heartbeat dispatcher and the liveness sweeper), many readers; protected
/// by a reader/writer lock per spec §5 "Shared resources".
#[derive(Clone)]
pub struct AgentRegistry {
    agents: Arc<RwLock<HashMap<AgentId, AgentRecord>>>,
    heartbeat_timeout: Duration,
}

impl AgentRegistry {
    pub fn new(heartbeat_timeout: Duration) -> Self {
        Self { agents: Arc::new(RwLock::new(HashMap::new())), heartbeat_timeout }
    }

    /// Load a registry from a already-hydrated table (spec §4.7 "on
    /// startup, ... hydrate their in-memory caches").
    pub fn from_records(records: impl IntoIterator<Item = AgentRecord>, heartbeat_timeout: Duration) -> Self {
        let map = records.into_iter().map(|r| (r.id, r)).collect();
        Self { agents: Arc::new(RwLock::new(map)), heartbeat_timeout }
    }

    pub fn get(&self, id: &AgentId) -> Option<AgentRecord> {
        self.agents.read().get(id).cloned()
    }

    pub fn is_alive(&self, id: &AgentId) -> bool {
        self.agents.read().get(id).is_some_and(|a| a.alive)
    }

    pub fn list(&self) -> Vec<AgentRecord> {
        self.agents.read().values().cloned().collect()
    }

    /// Apply spec §4.4 steps 1-4 to one heartbeat. The caller is
    /// responsible for persisting the resulting record and, if
    /// [`HeartbeatOutcome::needs_resubscribe`], kicking off subscription
    /// setup (C5) — this type only owns the in-memory decision.
    pub fn record_heartbeat(
        &self,
        id: AgentId,
        name: String,
        hostname: String,
        capabilities: CapabilityDocument,
        now: DateTime<Utc>,
    ) -> (AgentRecord, HeartbeatOutcome) {
        let mut agents = self.agents.write();
        match agents.get_mut(&id) {
            None => {
                let record = AgentRecord::from_first_heartbeat(id, name, hostname, capabilities, now);
                agents.insert(id, record.clone());
                (record, HeartbeatOutcome::NewAgent)
            }
            Some(record) if record.capabilities == capabilities => {
                record.record_repeat_heartbeat(now);
                (record.clone(), HeartbeatOutcome::Unchanged)
            }
            Some(record) => {
                record.record_changed_heartbeat(capabilities, now);
                (record.clone(), HeartbeatOutcome::CapabilitiesChanged)
            }
        }
    }

    /// Liveness sweep (spec §4.4 "background sweeper"): every live record
    /// whose `last_seen` has aged past the timeout is marked `!alive`.
    /// Returns the IDs that flipped, so the caller can wake the workflow
    /// death-sweep (spec §4.4 last sentence) and persist the change.
    pub fn sweep_liveness(&self, now: DateTime<Utc>) -> Vec<AgentId> {
        let mut flipped = Vec::new();
        let mut agents = self.agents.write();
        for record in agents.values_mut() {
            if record.alive && record.is_stale(now, self.heartbeat_timeout) {
                record.alive = false;
                flipped.push(record.id);
            }
        }
        flipped
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
