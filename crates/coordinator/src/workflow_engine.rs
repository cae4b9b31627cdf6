//! Workflow Engine (C6, spec §4.6) — the heart of the system. Durable
//! state machine over module invocations: validates, dispatches, tracks,
//! recovers.
//!
//! Grounded on `crates/engine/src/executor.rs`'s generic-over-adapter
//! shape (`Executor<S, A, N, C>` becomes `WorkflowEngine<B: BusClient>`)
//! and `crates/engine/src/runtime/monitor.rs`'s periodic-sweep idiom,
//! narrowed from a job/session domain to the five-step `ExecuteModule`
//! workflow spec §4.6 names.

use crate::observer::HeartbeatObserver;
use crate::registry::AgentRegistry;
use fleet_bus::BusClient;
use fleet_core::{AgentId, FleetError, ModuleDescriptor, Workflow, WorkflowId, WorkflowState, WorkflowTransition};
use fleet_storage::PersistencePort;
use fleet_wire::{ResultEnvelope, StateMessage};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Retries for the `Publish` step (spec §4.6 step 4: "retries=3").
const PUBLISH_RETRIES: u32 = 3;
const PUBLISH_RETRY_DELAY: Duration = Duration::from_millis(100);

struct Inner {
    workflows: HashMap<WorkflowId, Workflow>,
    /// Per-agent index of non-terminal workflows (spec §3 invariant 3/4).
    running_by_agent: HashMap<AgentId, HashSet<WorkflowId>>,
}

impl Inner {
    fn index_running(&mut self, workflow: &Workflow) {
        if workflow.current_state() == WorkflowState::Running {
            self.running_by_agent.entry(workflow.agent_id).or_default().insert(workflow.id);
        }
    }

    fn deindex_if_terminal(&mut self, workflow: &Workflow) {
        if workflow.current_state().is_terminal() {
            if let Some(set) = self.running_by_agent.get_mut(&workflow.agent_id) {
                set.remove(&workflow.id);
            }
        }
    }
}

/// Coordinator-side durable state machine over module invocations.
///
/// A single [`parking_lot::Mutex`] guards both the workflow table and the
/// per-agent running index; spec §5 asks for "a mutex keyed by workflow_id,
/// or equivalent" — this is the coarser equivalent, correct because every
/// critical section here is short (no bus I/O or persistence I/O happens
/// while the lock is held; publishes happen before the lock is taken and
/// persistence writes happen in their own brief critical section instead).
pub struct WorkflowEngine<B: BusClient, O: HeartbeatObserver = crate::observer::NoopObserver> {
    bus: B,
    registry: AgentRegistry,
    persistence: Arc<Mutex<PersistencePort>>,
    state: Arc<Mutex<Inner>>,
    observer: Arc<O>,
}

impl<B: BusClient> WorkflowEngine<B, crate::observer::NoopObserver> {
    pub fn new(bus: B, registry: AgentRegistry, persistence: Arc<Mutex<PersistencePort>>) -> Self {
        Self::with_observer(bus, registry, persistence, crate::observer::NoopObserver)
    }
}

impl<B: BusClient, O: HeartbeatObserver> WorkflowEngine<B, O> {
    pub fn with_observer(bus: B, registry: AgentRegistry, persistence: Arc<Mutex<PersistencePort>>, observer: O) -> Self {
        Self {
            bus,
            registry,
            persistence,
            state: Arc::new(Mutex::new(Inner { workflows: HashMap::new(), running_by_agent: HashMap::new() })),
            observer: Arc::new(observer),
        }
    }

    /// Hydrate the in-memory cache from a persisted table (spec §4.7 "on
    /// startup ... hydrate in-memory caches", spec §8 S6 "all 3 workflows
    /// present in RUNNING").
    pub fn hydrate(&self, workflows: impl IntoIterator<Item = Workflow>) {
        let mut state = self.state.lock();
        for workflow in workflows {
            state.index_running(&workflow);
            state.workflows.insert(workflow.id, workflow);
        }
    }

    pub fn get(&self, id: &WorkflowId) -> Option<Workflow> {
        self.state.lock().workflows.get(id).cloned()
    }

    pub fn list(&self, status: Option<WorkflowState>, limit: usize) -> Vec<Workflow> {
        let state = self.state.lock();
        let mut workflows: Vec<Workflow> = state
            .workflows
            .values()
            .filter(|w| status.map_or(true, |s| w.current_state() == s))
            .cloned()
            .collect();
        workflows.truncate(limit);
        workflows
    }

    /// The durable `ExecuteModule(agent_id, module_name, request)` workflow
    /// (spec §4.6 steps 1-5), for `ExecuteModule(mode=sync)` (spec §4.8):
    /// validation failures never create a workflow record.
    pub async fn execute_module(&self, agent_id: AgentId, module_name: &str, request: serde_json::Value, now: chrono::DateTime<chrono::Utc>) -> Result<WorkflowId, FleetError> {
        let descriptor = self.validate(agent_id, module_name, &request)?;
        let workflow = Workflow::new(agent_id, module_name, request, now);
        self.create_and_dispatch(workflow, descriptor.input_subject, now).await
    }

    /// The `ExecuteModule(mode=async)` variant (spec §4.8): `workflow_id`
    /// is minted and handed back before validation runs, matching "enqueues
    /// ... and returns the workflow_id immediately". Because the caller
    /// never sees a `Result` for this path, a validation failure still
    /// creates the workflow record (immediately `FAILED`, with the
    /// rejection reason attached) rather than silently discarding it —
    /// otherwise the returned `workflow_id` would resolve to nothing.
    pub async fn execute_module_reserved(&self, workflow_id: WorkflowId, agent_id: AgentId, module_name: &str, request: serde_json::Value, now: chrono::DateTime<chrono::Utc>) {
        let descriptor = match self.validate(agent_id, module_name, &request) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                self.create_failed(workflow_id, agent_id, module_name, request, now, err.to_string());
                return;
            }
        };
        let workflow = Workflow::with_id(workflow_id, agent_id, module_name, request, now);
        let _ = self.create_and_dispatch(workflow, descriptor.input_subject, now).await;
    }

    /// Steps 1-2 (spec §4.6): look up the agent and its module descriptor,
    /// validate `request` against the descriptor's schema.
    fn validate(&self, agent_id: AgentId, module_name: &str, request: &serde_json::Value) -> Result<ModuleDescriptor, FleetError> {
        let agent = self.registry.get(&agent_id).ok_or(FleetError::AgentUnavailable(agent_id))?;
        if !agent.alive {
            return Err(FleetError::AgentUnavailable(agent_id));
        }
        let descriptor = agent.capabilities.get(module_name).ok_or_else(|| FleetError::ModuleUnknown {
            agent_id,
            module_name: module_name.to_string(),
        })?;
        if let Err(error) = jsonschema::validate(&descriptor.input_schema, request) {
            return Err(FleetError::SchemaRejected { module_name: module_name.to_string(), reason: error.to_string() });
        }
        Ok(descriptor.clone())
    }

    /// Steps 3-5 (spec §4.6): create the RUNNING record, persist it, then
    /// publish the enriched request with retries.
    async fn create_and_dispatch(&self, workflow: Workflow, input_subject: String, now: chrono::DateTime<chrono::Utc>) -> Result<WorkflowId, FleetError> {
        let workflow_id = workflow.id;
        {
            let mut state = self.state.lock();
            state.index_running(&workflow);
            state.workflows.insert(workflow_id, workflow.clone());
        }
        if let Err(err) = self.persistence.lock().create_workflow(workflow.clone()) {
            tracing::warn!(workflow_id = %workflow_id, error = %err, "failed to persist new workflow");
        }

        let payload = serde_json::to_vec(&workflow.request).map_err(|e| FleetError::BusUnavailable(e.to_string()))?;
        if let Err(err) = self.publish_with_retries(&input_subject, payload).await {
            self.transition(workflow_id, WorkflowState::Failed, now, Some(err.to_string()));
            return Err(err.into());
        }

        Ok(workflow_id)
    }

    /// Build a workflow record that is `FAILED` from the moment it's
    /// created — used only by [`Self::execute_module_reserved`]'s
    /// validation-failure path, see that method's doc comment.
    fn create_failed(&self, workflow_id: WorkflowId, agent_id: AgentId, module_name: &str, request: serde_json::Value, now: chrono::DateTime<chrono::Utc>, reason: String) {
        let mut workflow = Workflow::with_id(workflow_id, agent_id, module_name, request, now);
        workflow.transition(WorkflowState::Failed, now, Some(reason));
        self.state.lock().workflows.insert(workflow_id, workflow.clone());
        if let Err(err) = self.persistence.lock().create_workflow(workflow) {
            tracing::warn!(workflow_id = %workflow_id, error = %err, "failed to persist rejected reserved workflow");
        }
    }

    async fn publish_with_retries(&self, subject: &str, payload: Vec<u8>) -> Result<(), fleet_bus::BusError> {
        let mut attempt = 0;
        loop {
            match self.bus.publish(subject, payload.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt + 1 >= PUBLISH_RETRIES => return Err(err),
                Err(err) => {
                    tracing::warn!(subject, attempt, error = %err, "publish failed, retrying");
                    tokio::time::sleep(PUBLISH_RETRY_DELAY).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Result handler (spec §4.6 "Result handler"), invoked by a C5
    /// subscription on an agent's output subject.
    pub fn handle_result(&self, payload: &[u8], now: chrono::DateTime<chrono::Utc>) {
        let envelope = match ResultEnvelope::parse(payload) {
            Ok(envelope) => envelope,
            Err(error) => {
                tracing::debug!(%error, "discarding malformed result payload");
                return;
            }
        };
        let Some(workflow_id) = envelope.workflow_id() else {
            tracing::debug!("discarding untracked result (no workflow_id)");
            return;
        };
        if !self.state.lock().workflows.contains_key(&workflow_id) {
            tracing::debug!(workflow_id = %workflow_id, "discarding result for unknown workflow");
            return;
        }
        let state = if envelope.is_success() { WorkflowState::Completed } else { WorkflowState::Failed };
        self.transition(workflow_id, state, now, envelope.error_message());
    }

    /// Agent-state handler (spec §4.6 "Agent-state handler"), invoked on
    /// every `agent.module.state` message.
    pub fn handle_agent_state(&self, message: &StateMessage, now: chrono::DateTime<chrono::Utc>) {
        let Some(workflow_id) = message.workflow_id else { return };
        let Some(domain_state) = message.state.to_domain() else { return };
        if !self.state.lock().workflows.contains_key(&workflow_id) {
            return;
        }
        self.transition(workflow_id, domain_state, now, message.error_message.clone());
    }

    /// Agent-death sweeper (spec §4.6 "Agent-death sweeper"): recovers
    /// workflows orphaned by agent loss.
    pub fn sweep_dead_agents(&self, now: chrono::DateTime<chrono::Utc>) -> Vec<WorkflowId> {
        let running: Vec<WorkflowId> = {
            let state = self.state.lock();
            state.running_by_agent.values().flatten().copied().collect()
        };
        let mut failed = Vec::new();
        for workflow_id in running {
            let agent_id = match self.state.lock().workflows.get(&workflow_id) {
                Some(w) => w.agent_id,
                None => continue,
            };
            if !self.registry.is_alive(&agent_id) {
                self.transition(workflow_id, WorkflowState::Failed, now, Some("agent died".to_string()));
                failed.push(workflow_id);
            }
        }
        failed
    }

    /// External cancel (spec §4.6 "Cancellation"). A no-op on an
    /// already-terminal workflow, returning its current state.
    pub fn cancel(&self, workflow_id: WorkflowId, now: chrono::DateTime<chrono::Utc>) -> Result<WorkflowState, FleetError> {
        let current = self.state.lock().workflows.get(&workflow_id).map(Workflow::current_state).ok_or(FleetError::WorkflowNotFound(workflow_id))?;
        if current.is_terminal() {
            return Ok(current);
        }
        self.transition(workflow_id, WorkflowState::Failed, now, Some("cancelled".to_string()));
        Ok(WorkflowState::Failed)
    }

    /// Apply one transition under the state lock, persist it in the same
    /// critical section's *result* (spec §4.6 "writes to both the
    /// in-memory history and the persistence port"), and notify the
    /// observer. Sticky terminal states are enforced by
    /// [`Workflow::transition`] itself.
    fn transition(&self, workflow_id: WorkflowId, state: WorkflowState, at: chrono::DateTime<chrono::Utc>, reason: Option<String>) {
        let applied = {
            let mut inner = self.state.lock();
            let Some(workflow) = inner.workflows.get_mut(&workflow_id) else { return };
            let applied = workflow.transition(state, at, reason.clone());
            if applied {
                let snapshot = workflow.clone();
                inner.deindex_if_terminal(&snapshot);
            }
            applied
        };
        if !applied {
            return;
        }
        if let Err(err) = self.persistence.lock().append_transition(workflow_id, WorkflowTransition { state, at, reason }) {
            tracing::warn!(workflow_id = %workflow_id, error = %err, "failed to persist workflow transition");
        }
        self.observer.on_workflow_transition(workflow_id, state);
    }
}

#[cfg(test)]
#[path = "workflow_engine_tests.rs"]
mod tests;
