#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-coordinator: the Agent Registry (C4, spec §4.4), the Subscription
//! Manager (C5, spec §4.5), the Workflow Engine (C6, spec §4.6), and the
//! Public API Port (C8, spec §4.8) that sits in front of them.

pub mod api;
pub mod observer;
pub mod registry;
pub mod subscriptions;
pub mod workflow_engine;

pub use api::{ApiPort, DEFAULT_ASYNC_CONCURRENCY, DEFAULT_ASYNC_QUEUE_CAPACITY};
pub use observer::{HeartbeatObserver, NoopObserver};
pub use registry::{AgentRegistry, HeartbeatOutcome, DEFAULT_HEARTBEAT_TIMEOUT};
pub use subscriptions::{target_subjects, SubscriptionManager};
pub use workflow_engine::WorkflowEngine;
