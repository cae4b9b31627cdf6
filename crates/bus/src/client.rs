//! The `BusClient` contract (spec §4.1).

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum BusError {
    #[error("bus unavailable: {0}")]
    Unavailable(String),
}

impl From<BusError> for fleet_core::FleetError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::Unavailable(reason) => fleet_core::FleetError::BusUnavailable(reason),
        }
    }
}

/// A callback invoked for every message delivered to a subscription.
/// Handlers never see bus-level exceptions propagate back to the reader
/// loop (spec §7 "Callback handlers on subscription never propagate
/// exceptions to the bus client"); implementations must catch and log
/// internally, which is why this is a plain `Fn`, not a `Result`-returning
/// one.
pub type Handler = Arc<dyn Fn(&str, Vec<u8>) + Send + Sync>;

/// An opaque handle representing one subscription, used only to tell two
/// subscriptions apart; the bus model in spec §4.1 does not expose
/// `unsubscribe`, so this carries no drop behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(pub u64);

/// Thin wrapper over the pub/sub bus (spec §4.1).
///
/// Reconnection is transparent to callers: implementations re-arm every
/// previously-established subscription after a reconnect (spec §4.1,
/// second paragraph). Callback dispatch never blocks the bus's own reader
/// task — see [`crate::pool`].
#[async_trait]
pub trait BusClient: Clone + Send + Sync + 'static {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError>;

    async fn subscribe(&self, subject: &str, handler: Handler) -> Result<Subscription, BusError>;

    /// Flush pending publishes then close (spec §4.1 `drain()`).
    async fn drain(&self) -> Result<(), BusError>;
}
