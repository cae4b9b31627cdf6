//! Public API Port (C8, spec §4.8): the external-facing command/query
//! surface onto the registry and workflow engine. Protocol-independent —
//! `fleet-daemon`'s control-socket listener is the only thing that knows
//! about `fleet-wire`'s framing; this type deals only in domain values.
//!
//! The async execution queue is grounded on `fleet-bus`'s `DispatchPool`
//! (semaphore-gated concurrency, spawn-per-job) generalized from "drop on
//! saturation" to "reject with `QueueFull`" (spec §4.8 "async enqueues onto
//! a bounded execution queue ... default 10"; spec §5 "enqueue blocks or
//! rejects with `QueueFull`, implementation's choice — must be
//! documented": this implementation rejects).

use crate::registry::AgentRegistry;
use crate::workflow_engine::WorkflowEngine;
use chrono::{DateTime, Utc};
use fleet_bus::BusClient;
use fleet_core::{AgentId, AgentRecord, FleetError, Workflow, WorkflowId, WorkflowState};
use fleet_wire::{AgentFilter, ExecMode};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Default worker concurrency for the async execution queue (spec §4.8
/// "worker concurrency configurable, default 10").
pub const DEFAULT_ASYNC_CONCURRENCY: usize = 10;
/// Default channel capacity before `ExecuteModule(mode=async)` starts
/// rejecting with `QueueFull`.
pub const DEFAULT_ASYNC_QUEUE_CAPACITY: usize = 256;

struct AsyncJob {
    workflow_id: WorkflowId,
    agent_id: AgentId,
    module_name: String,
    request: serde_json::Value,
    now: DateTime<Utc>,
}

pub struct ApiPort<B: BusClient> {
    registry: AgentRegistry,
    engine: Arc<WorkflowEngine<B>>,
    queue: mpsc::Sender<AsyncJob>,
}

impl<B: BusClient> Clone for ApiPort<B> {
    fn clone(&self) -> Self {
        Self { registry: self.registry.clone(), engine: Arc::clone(&self.engine), queue: self.queue.clone() }
    }
}

impl<B: BusClient> ApiPort<B> {
    pub fn new(registry: AgentRegistry, engine: Arc<WorkflowEngine<B>>) -> Self {
        Self::with_concurrency(registry, engine, DEFAULT_ASYNC_CONCURRENCY, DEFAULT_ASYNC_QUEUE_CAPACITY)
    }

    pub fn with_concurrency(registry: AgentRegistry, engine: Arc<WorkflowEngine<B>>, concurrency: usize, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity);
        tokio::spawn(run_async_workers(rx, Arc::clone(&engine), concurrency));
        Self { registry, engine, queue: tx }
    }

    pub fn list_agents(&self, filter: AgentFilter) -> Vec<AgentRecord> {
        self.registry
            .list()
            .into_iter()
            .filter(|a| match filter {
                AgentFilter::All => true,
                AgentFilter::Alive => a.alive,
                AgentFilter::Dead => !a.alive,
            })
            .collect()
    }

    pub fn get_agent(&self, agent_id: &AgentId) -> Option<AgentRecord> {
        self.registry.get(agent_id)
    }

    /// `ExecuteModule` (spec §4.8). `Sync` runs the durable workflow inline
    /// and returns once it's accepted or rejected; `Async` reserves a
    /// `workflow_id` and enqueues the work, returning immediately.
    pub async fn execute_module(&self, agent_id: AgentId, module_name: &str, request_body: serde_json::Value, mode: ExecMode) -> Result<WorkflowId, FleetError> {
        match mode {
            ExecMode::Sync => self.engine.execute_module(agent_id, module_name, request_body, Utc::now()).await,
            ExecMode::Async => {
                let workflow_id = WorkflowId::new();
                let job = AsyncJob { workflow_id, agent_id, module_name: module_name.to_string(), request: request_body, now: Utc::now() };
                self.queue.try_send(job).map_err(|_| FleetError::QueueFull)?;
                Ok(workflow_id)
            }
        }
    }

    pub fn list_workflows(&self, status: Option<WorkflowState>, limit: usize) -> Vec<Workflow> {
        self.engine.list(status, limit.min(fleet_wire::MAX_LIST_WORKFLOWS_LIMIT))
    }

    pub fn get_workflow(&self, workflow_id: &WorkflowId) -> Option<Workflow> {
        self.engine.get(workflow_id)
    }

    pub fn cancel_workflow(&self, workflow_id: WorkflowId) -> Result<WorkflowState, FleetError> {
        self.engine.cancel(workflow_id, Utc::now())
    }
}

async fn run_async_workers<B: BusClient>(mut queue: mpsc::Receiver<AsyncJob>, engine: Arc<WorkflowEngine<B>>, concurrency: usize) {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    while let Some(job) = queue.recv().await {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else { break };
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let _permit = permit;
            engine.execute_module_reserved(job.workflow_id, job.agent_id, &job.module_name, job.request, job.now).await;
        });
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
