//! Grounded on `original_source/modules/faulty_module.py`'s `FaultyModule`:
//! a deliberately unreliable module for exercising crash handling,
//! duplicate-message rejection, and simulated delay (SPEC_FULL.md §C).

use crate::module::{self, Module, ModuleContext, ModuleError, ReportedState};
use async_trait::async_trait;
use fleet_bus::{BusClient, Handler};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Default)]
pub struct FaultyModule {
    processed_ids: Arc<Mutex<HashSet<String>>>,
}

#[async_trait]
impl<B: BusClient + Clone + 'static> Module<B> for FaultyModule {
    fn name(&self) -> &'static str {
        "faulty"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["message"]})
    }

    async fn run(&mut self, ctx: ModuleContext<B>) -> Result<(), ModuleError> {
        let output_subject = ctx.output_subject.clone();
        let error_subject = ctx.error_subject.clone();
        let agent_id = ctx.agent_id;
        let bus = ctx.bus.clone();
        let processed_ids = Arc::clone(&self.processed_ids);

        let handler: Handler = Arc::new(move |_subject, payload| {
            let bus = bus.clone();
            let output_subject = output_subject.clone();
            let error_subject = error_subject.clone();
            let processed_ids = Arc::clone(&processed_ids);
            tokio::spawn(async move {
                handle(bus, agent_id, &payload, output_subject, error_subject, processed_ids).await;
            });
        });

        ctx.bus.subscribe(&ctx.input_subject, handler).await?;
        tracing::info!(subject = %ctx.input_subject, "faulty: listening");
        Ok(())
    }
}

async fn handle<B: BusClient>(
    bus: B,
    agent_id: fleet_core::AgentId,
    payload: &[u8],
    output_subject: String,
    error_subject: String,
    processed_ids: Arc<Mutex<HashSet<String>>>,
) {
    let Ok(request) = serde_json::from_slice::<serde_json::Value>(payload) else {
        let _ = bus.publish(&error_subject, b"malformed payload".to_vec()).await;
        return;
    };
    let workflow_id = module::extract_workflow_id(&request);
    module::report_state(
        &bus,
        agent_id,
        "faulty",
        ReportedState::Running,
        workflow_id,
        None,
        Some(serde_json::json!({"action": "processing_request"})),
    )
    .await;

    if let Some(delay_secs) = request.get("delay").and_then(|v| v.as_u64()) {
        tokio::time::sleep(std::time::Duration::from_secs(delay_secs)).await;
    }

    if request.get("crash").and_then(|v| v.as_bool()).unwrap_or(false) {
        let message = "Intentional crash triggered.".to_string();
        let _ = bus.publish(&error_subject, message.clone().into_bytes()).await;
        module::report_state(&bus, agent_id, "faulty", ReportedState::Failed, workflow_id, Some(message), None).await;
        return;
    }

    if let Some(message_id) = request.get("id").and_then(|v| v.as_str()) {
        let already_seen = {
            let mut seen = processed_ids.lock();
            !seen.insert(message_id.to_string())
        };
        if already_seen {
            module::report_state(
                &bus,
                agent_id,
                "faulty",
                ReportedState::Failed,
                workflow_id,
                Some("Duplicate message".to_string()),
                Some(serde_json::json!({"action": "duplicate_ignored"})),
            )
            .await;
            return;
        }
    }

    let response = serde_json::json!({
        "from_module": "faulty",
        "processed_at": chrono::Utc::now().to_rfc3339(),
        "input": request,
        "workflow_id": workflow_id,
    });

    match serde_json::to_vec(&response) {
        Ok(bytes) => {
            if bus.publish(&output_subject, bytes).await.is_ok() {
                module::report_state(
                    &bus,
                    agent_id,
                    "faulty",
                    ReportedState::Completed,
                    workflow_id,
                    None,
                    Some(serde_json::json!({"action": "request_completed"})),
                )
                .await;
            } else {
                module::report_state(&bus, agent_id, "faulty", ReportedState::Failed, workflow_id, Some("publish failed".to_string()), None).await;
            }
        }
        Err(error) => {
            let _ = bus.publish(&error_subject, error.to_string().into_bytes()).await;
            module::report_state(&bus, agent_id, "faulty", ReportedState::Failed, workflow_id, Some(error.to_string()), None).await;
        }
    }
}

#[cfg(test)]
#[path = "faulty_tests.rs"]
mod tests;
