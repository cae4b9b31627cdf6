//! The supervised task runtime (spec §4.2 step 4, C2). Grounded on
//! `original_source/src/aiori_agent/base.py`'s `BaseWorker.__run__`/`start`/
//! `stop` and `module_manager.py`'s `_on_crash`.
//!
//! `run()` on the demo modules only subscribes and returns (spec §9
//! "callback-on-subscribe"), so "completed" fires right after the spawned
//! task's `run()` call resolves, exactly like the Python original reports
//! "completed" immediately after `await self.run()` returns — the
//! subscription itself keeps handling messages via the bus's own dispatch,
//! decoupled from this supervised task's lifecycle.

use crate::module::{report_state, Module, ModuleContext, ReportedState};
use fleet_bus::BusClient;
use fleet_core::AgentId;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, thiserror::Error)]
pub enum SupervisorError {
    #[error("module {0} did not stop within the timeout")]
    StopTimeout(String),
}

/// A running module's task handle, returned by [`Supervisor::start`] and
/// consumed by [`Supervisor::stop`].
pub struct SupervisedModule {
    name: String,
    handle: JoinHandle<()>,
}

impl SupervisedModule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[derive(Clone)]
pub struct Supervisor<B: BusClient> {
    bus: B,
    agent_id: AgentId,
    crash_dir: PathBuf,
}

impl<B: BusClient + Clone + 'static> Supervisor<B> {
    pub fn new(bus: B, agent_id: AgentId, crash_dir: PathBuf) -> Self {
        Self { bus, agent_id, crash_dir }
    }

    /// Spawns `module.run(ctx)` as a supervised task, reporting
    /// started/running around it the way `BaseWorker.start` does.
    pub async fn start(&self, mut module: Box<dyn Module<B>>, ctx: ModuleContext<B>) -> SupervisedModule {
        let name = module.name().to_string();
        report_state(&self.bus, self.agent_id, &name, ReportedState::Started, None, None, None).await;

        let bus = self.bus.clone();
        let agent_id = self.agent_id;
        let crash_dir = self.crash_dir.clone();
        let task_name = name.clone();
        let handle = tokio::spawn(async move {
            match module.run(ctx).await {
                Ok(()) => {
                    report_state(&bus, agent_id, &task_name, ReportedState::Completed, None, None, None).await;
                }
                Err(error) => {
                    write_crash_record(&crash_dir, &task_name, &error.to_string()).await;
                    let payload = serde_json::json!({"module": task_name, "error": error.to_string()});
                    if let Ok(bytes) = serde_json::to_vec(&payload) {
                        let _ = bus.publish(fleet_bus::subject::ERROR, bytes).await;
                    }
                    report_state(&bus, agent_id, &task_name, ReportedState::Error, None, Some(error.to_string()), None).await;
                }
            }
        });

        report_state(&self.bus, self.agent_id, &name, ReportedState::Running, None, None, None).await;
        SupervisedModule { name, handle }
    }

    /// Cancels the task and waits up to `timeout` for it to finish,
    /// mirroring `BaseWorker.stop`'s polling loop.
    pub async fn stop(&self, supervised: SupervisedModule, timeout: Duration) -> Result<(), SupervisorError> {
        supervised.handle.abort();
        match tokio::time::timeout(timeout, supervised.handle).await {
            Ok(_) => Ok(()),
            Err(_) => Err(SupervisorError::StopTimeout(supervised.name)),
        }
    }
}

async fn write_crash_record(crash_dir: &Path, module_name: &str, error: &str) {
    if let Err(e) = tokio::fs::create_dir_all(crash_dir).await {
        tracing::warn!(%e, "failed to create crash directory");
        return;
    }
    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.fZ");
    let path = crash_dir.join(format!("{module_name}-{timestamp}.json"));
    let record = serde_json::json!({"module": module_name, "error": error});
    if let Ok(bytes) = serde_json::to_vec_pretty(&record) {
        if let Err(e) = tokio::fs::write(&path, bytes).await {
            tracing::warn!(%e, path = %path.display(), "failed to write crash record");
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
