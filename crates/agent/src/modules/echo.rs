//! Grounded on `original_source/modules/echo_module.py`'s `WorkingModule`:
//! echoes the request back on the output subject with a `processed_at`
//! timestamp and the module name stamped on, reporting state around it.

use crate::module::{self, Module, ModuleContext, ModuleError, ReportedState};
use async_trait::async_trait;
use fleet_bus::{BusClient, Handler};
use std::sync::Arc;

#[derive(Default)]
pub struct EchoModule;

#[async_trait]
impl<B: BusClient + Clone + 'static> Module<B> for EchoModule {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["message"]})
    }

    async fn run(&mut self, ctx: ModuleContext<B>) -> Result<(), ModuleError> {
        let output_subject = ctx.output_subject.clone();
        let error_subject = ctx.error_subject.clone();
        let agent_id = ctx.agent_id;
        let bus = ctx.bus.clone();

        let handler: Handler = Arc::new(move |_subject, payload| {
            let bus = bus.clone();
            let output_subject = output_subject.clone();
            let error_subject = error_subject.clone();
            tokio::spawn(async move {
                handle(bus, agent_id, &payload, output_subject, error_subject).await;
            });
        });

        ctx.bus.subscribe(&ctx.input_subject, handler).await?;
        tracing::info!(subject = %ctx.input_subject, "echo: listening");
        Ok(())
    }
}

async fn handle<B: BusClient>(bus: B, agent_id: fleet_core::AgentId, payload: &[u8], output_subject: String, error_subject: String) {
    let Ok(mut value) = serde_json::from_slice::<serde_json::Value>(payload) else {
        let _ = bus.publish(&error_subject, b"malformed payload".to_vec()).await;
        return;
    };
    let workflow_id = module::extract_workflow_id(&value);
    module::report_state(&bus, agent_id, "echo", ReportedState::Running, workflow_id, None, None).await;

    if let serde_json::Value::Object(map) = &mut value {
        map.insert("processed_at".to_string(), serde_json::json!(chrono::Utc::now().to_rfc3339()));
        map.insert("from_module".to_string(), serde_json::json!("echo"));
        map.insert("success".to_string(), serde_json::json!(true));
    }

    match serde_json::to_vec(&value) {
        Ok(bytes) => {
            if bus.publish(&output_subject, bytes).await.is_ok() {
                module::report_state(&bus, agent_id, "echo", ReportedState::Completed, workflow_id, None, None).await;
            } else {
                module::report_state(&bus, agent_id, "echo", ReportedState::Error, workflow_id, Some("publish failed".to_string()), None).await;
            }
        }
        Err(error) => {
            let _ = bus.publish(&error_subject, error.to_string().into_bytes()).await;
            module::report_state(&bus, agent_id, "echo", ReportedState::Error, workflow_id, Some(error.to_string()), None).await;
        }
    }
}

#[cfg(test)]
#[path = "echo_tests.rs"]
mod tests;
