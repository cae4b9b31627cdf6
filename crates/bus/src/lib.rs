#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-bus: the Bus Client (C1, spec §4.1) — a thin wrapper over the
//! pub/sub message bus, plus subject naming (spec §4.3 "Subject layout")
//! and a bounded dispatch pool for backpressure (spec §5 "Backpressure").

mod client;
mod nats_client;
mod pool;
mod reconnect;
pub mod subject;

pub use client::{BusClient, BusError, Handler, Subscription};
pub use nats_client::NatsBusClient;
pub use reconnect::ReconnectPolicy;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBusClient;
