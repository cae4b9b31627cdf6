//! Grounded on `original_source/modules/ping_module.py`'s `PingModule`:
//! pings a host and reports round-trip timings. The original shells out to
//! `icmplib`/`tcping`; raw ICMP needs privileges this agent shouldn't
//! require, so this translation keeps the TCP-connect fallback path the
//! Python module already falls back to on ICMP failure and drops the ICMP
//! attempt entirely.

use crate::module::{self, Module, ModuleContext, ModuleError, ReportedState};
use async_trait::async_trait;
use fleet_bus::{BusClient, Handler};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Default)]
pub struct PingModule;

#[derive(Debug, Deserialize)]
struct PingQuery {
    host: String,
    #[serde(default = "default_count")]
    count: u32,
    #[serde(default = "default_port")]
    port: u16,
}

fn default_count() -> u32 {
    3
}

fn default_port() -> u16 {
    80
}

#[async_trait]
impl<B: BusClient + Clone + 'static> Module<B> for PingModule {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "required": ["host"]})
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
        tracing::info!(subject = %ctx.input_subject, "ping: listening");
        Ok(())
    }
}

async fn handle<B: BusClient>(bus: B, agent_id: fleet_core::AgentId, payload: &[u8], output_subject: String, error_subject: String) {
    let Ok(request) = serde_json::from_slice::<serde_json::Value>(payload) else {
        let _ = bus.publish(&error_subject, b"malformed payload".to_vec()).await;
        return;
    };
    let workflow_id = module::extract_workflow_id(&request);
    let query: PingQuery = match serde_json::from_value(request) {
        Ok(query) => query,
        Err(error) => {
            let _ = bus.publish(&error_subject, error.to_string().into_bytes()).await;
            module::report_state(&bus, agent_id, "ping", ReportedState::Error, workflow_id, Some(error.to_string()), None).await;
            return;
        }
    };

    module::report_state(&bus, agent_id, "ping", ReportedState::Running, workflow_id, None, Some(serde_json::json!({"action": "processing_request"}))).await;

    let mut rtts = Vec::with_capacity(query.count as usize);
    let mut received = 0u32;
    for _ in 0..query.count {
        let start = Instant::now();
        let address = format!("{}:{}", query.host, query.port);
        match timeout(Duration::from_secs(5), TcpStream::connect(&address)).await {
            Ok(Ok(_stream)) => {
                rtts.push(start.elapsed().as_secs_f64() * 1000.0);
                received += 1;
            }
            _ => continue,
        }
    }

    let result = serde_json::json!({
        "address": query.host,
        "rtts": rtts,
        "packets_received": received,
        "packets_sent": query.count,
    });

    match serde_json::to_vec(&result) {
        Ok(bytes) => {
            if bus.publish(&output_subject, bytes).await.is_ok() {
                module::report_state(&bus, agent_id, "ping", ReportedState::Completed, workflow_id, None, Some(serde_json::json!({"action": "request_completed"}))).await;
            } else {
                module::report_state(&bus, agent_id, "ping", ReportedState::Error, workflow_id, Some("publish failed".to_string()), None).await;
            }
        }
        Err(error) => {
            let _ = bus.publish(&error_subject, error.to_string().into_bytes()).await;
            module::report_state(&bus, agent_id, "ping", ReportedState::Error, workflow_id, Some(error.to_string()), None).await;
        }
    }
}

#[cfg(test)]
#[path = "ping_tests.rs"]
mod tests;
