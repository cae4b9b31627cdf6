//! The module contract (spec §4.2, §9 "Polymorphic workers"): `setup`,
//! `run`, optional `serializer`. Grounded directly on
//! `original_source/src/aiori_agent/base.py`'s `BaseWorker`, translated
//! from inheritance to a trait object plus an explicit context struct
//! (spec §9 "shared per-agent state held inside the worker base class").

use async_trait::async_trait;
use fleet_bus::BusClient;
use fleet_core::AgentId;

/// Everything a module needs that would otherwise live on a shared base
/// class (spec §9): identity, a bus handle, and the three subjects this
/// module's descriptor advertises.
#[derive(Clone)]
pub struct ModuleContext<B: BusClient> {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub bus: B,
    pub input_subject: String,
    pub output_subject: String,
    pub error_subject: String,
}

impl<B: BusClient> ModuleContext<B> {
    pub fn new(agent_id: AgentId, agent_name: String, bus: B, module_name: &str) -> Self {
        Self {
            input_subject: fleet_bus::subject::module_in(&agent_id, module_name),
            output_subject: fleet_bus::subject::module_out(&agent_id, module_name),
            error_subject: fleet_bus::subject::module_error(&agent_id, module_name),
            agent_id,
            agent_name,
            bus,
        }
    }
}

/// A single module worker (spec §4.2 step 2: "locate its single exported
/// worker class"). One instance per loaded module per agent process.
#[async_trait]
pub trait Module<B: BusClient>: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Optional JSON-Schema-equivalent for this module's input (spec §9
    /// "serializer is the schema provider"). `None` falls back to a
    /// permissive `{"type": "object"}`.
    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    /// Returns `false` to skip instantiation (spec §4.2 step 3).
    async fn setup(&mut self) -> bool {
        true
    }

    /// Subscribes to `ctx.input_subject` and runs until cancelled. Spec
    /// §4.2: "runs under a supervised task" — the supervisor (`supervisor.rs`)
    /// owns lifecycle-state reporting around this call; the module itself
    /// only needs to handle its own input/output/error subjects.
    async fn run(&mut self, ctx: ModuleContext<B>) -> Result<(), ModuleError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ModuleError {
    #[error("module failed: {0}")]
    Failed(String),
    #[error("bus error: {0}")]
    Bus(#[from] fleet_bus::BusError),
}

/// The per-invocation and per-lifecycle state a module reports on the
/// canonical state subject (spec §4.2 "State-message schema").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedState {
    Started,
    Running,
    Completed,
    Error,
    Failed,
}

impl ReportedState {
    fn to_wire(self) -> fleet_wire::WireModuleState {
        match self {
            Self::Started => fleet_wire::WireModuleState::Started,
            Self::Running => fleet_wire::WireModuleState::Running,
            Self::Completed => fleet_wire::WireModuleState::Completed,
            Self::Error => fleet_wire::WireModuleState::Error,
            Self::Failed => fleet_wire::WireModuleState::Failed,
        }
    }
}

/// Publishes module lifecycle/invocation state on `agent.module.state`
/// (spec §4.2 "`_report_state`" / canonical state subject).
pub async fn report_state<B: BusClient>(
    bus: &B,
    agent_id: AgentId,
    module_name: &str,
    state: ReportedState,
    workflow_id: Option<fleet_core::WorkflowId>,
    error_message: Option<String>,
    details: Option<serde_json::Value>,
) {
    let message = fleet_wire::StateMessage {
        agent_id,
        module_name: module_name.to_string(),
        state: state.to_wire(),
        workflow_id,
        error_message,
        details,
    };
    let Ok(payload) = serde_json::to_vec(&message) else { return };
    if let Err(error) = bus.publish(fleet_bus::subject::MODULE_STATE, payload).await {
        tracing::warn!(module = module_name, %error, "failed to report module state");
    }
}

/// Extract `workflow_id` from a module's inbound payload, if present (spec
/// §4.2: "tagged with the `workflow_id` found in the payload").
pub fn extract_workflow_id(payload: &serde_json::Value) -> Option<fleet_core::WorkflowId> {
    payload.get("workflow_id").and_then(|v| v.as_str()).map(fleet_core::WorkflowId::from_string)
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
