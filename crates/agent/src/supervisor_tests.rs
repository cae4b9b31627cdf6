use super::*;
use crate::module::ModuleError;
use async_trait::async_trait;
use fleet_bus::FakeBusClient;
use tempfile::tempdir;

struct ImmediateModule;

#[async_trait]
impl Module<FakeBusClient> for ImmediateModule {
    fn name(&self) -> &'static str {
        "immediate"
    }
    async fn run(&mut self, _ctx: ModuleContext<FakeBusClient>) -> Result<(), ModuleError> {
        Ok(())
    }
}

struct CrashingModule;

#[async_trait]
impl Module<FakeBusClient> for CrashingModule {
    fn name(&self) -> &'static str {
        "crashing"
    }
    async fn run(&mut self, _ctx: ModuleContext<FakeBusClient>) -> Result<(), ModuleError> {
        Err(ModuleError::Failed("boom".to_string()))
    }
}

struct ForeverModule;

#[async_trait]
impl Module<FakeBusClient> for ForeverModule {
    fn name(&self) -> &'static str {
        "forever"
    }
    async fn run(&mut self, _ctx: ModuleContext<FakeBusClient>) -> Result<(), ModuleError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

fn context(bus: FakeBusClient, module_name: &str) -> ModuleContext<FakeBusClient> {
    ModuleContext::new(AgentId::from_string("a1"), "agent-one".to_string(), bus, module_name)
}

#[tokio::test]
async fn start_reports_started_then_running_then_completed_for_a_well_behaved_module() {
    let bus = FakeBusClient::new();
    let crash_dir = tempdir().unwrap();
    let supervisor = Supervisor::new(bus.clone(), AgentId::from_string("a1"), crash_dir.path().to_path_buf());
    let ctx = context(bus.clone(), "immediate");
    let supervised = supervisor.start(Box::new(ImmediateModule), ctx).await;
    supervisor.stop(supervised, Duration::from_secs(1)).await.unwrap();

    let states = bus.published_to(fleet_bus::subject::MODULE_STATE);
    let decoded: Vec<fleet_wire::StateMessage> = states.iter().map(|bytes| serde_json::from_slice(bytes).unwrap()).collect();
    assert!(decoded.iter().any(|m| m.state == fleet_wire::WireModuleState::Started));
    assert!(decoded.iter().any(|m| m.state == fleet_wire::WireModuleState::Running));
}

#[tokio::test]
async fn a_module_that_returns_an_error_writes_a_crash_record_and_publishes_agent_error() {
    let bus = FakeBusClient::new();
    let crash_dir = tempdir().unwrap();
    let supervisor = Supervisor::new(bus.clone(), AgentId::from_string("a1"), crash_dir.path().to_path_buf());
    let ctx = context(bus.clone(), "crashing");
    let supervised = supervisor.start(Box::new(CrashingModule), ctx).await;

    for _ in 0..50 {
        if supervised.is_finished() {
            break;
        }
        tokio::task::yield_now().await;
    }

    let entries: Vec<_> = std::fs::read_dir(crash_dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(bus.published_to(fleet_bus::subject::ERROR).len(), 1);
}

#[tokio::test]
async fn stop_aborts_a_long_running_module_within_the_timeout() {
    let bus = FakeBusClient::new();
    let crash_dir = tempdir().unwrap();
    let supervisor = Supervisor::new(bus.clone(), AgentId::from_string("a1"), crash_dir.path().to_path_buf());
    let ctx = context(bus.clone(), "forever");
    let supervised = supervisor.start(Box::new(ForeverModule), ctx).await;
    supervisor.stop(supervised, Duration::from_secs(2)).await.unwrap();
}
