//! Hook point for an external OLAP sink (spec §6 "OLAP sink (external,
//! optional)", Open Question 4). The core never depends on a column store;
//! it only calls this narrow interface on the events the sink would want
//! to sample — an external crate can attach a real sampler without
//! touching the registry or workflow engine.

use fleet_core::{AgentId, WorkflowId, WorkflowState};

/// Observes fleet events for external analytics. The default `NoopObserver`
/// implements every method as a no-op; a real sink wraps a rate limiter
/// (spec §6: "heartbeat insertion is rate-limited per agent, default >= 30s
/// between inserts") around its own batching client.
pub trait HeartbeatObserver: Send + Sync + 'static {
    fn on_heartbeat(&self, _agent_id: AgentId) {}
    fn on_workflow_transition(&self, _workflow_id: WorkflowId, _state: WorkflowState) {}
}

/// The default observer: does nothing. Used whenever no external sink is
/// configured, which is the common case per spec §6's "treat the sink as
/// external" resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl HeartbeatObserver for NoopObserver {}
