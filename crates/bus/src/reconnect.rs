//! Reconnect backoff policy (spec §4.5 "exponential backoff, factor 2").

use std::time::Duration;

/// Exponential backoff schedule used both by the NATS transport's own
/// reconnect loop and by callers retrying a failed `publish`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: u32,
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
            factor: 2,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the `attempt`-th retry (0-indexed), capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let scale = self.factor.saturating_pow(attempt.min(31));
        let millis = self
            .initial_delay
            .as_millis()
            .saturating_mul(scale as u128)
            .min(self.max_delay.as_millis());
        Duration::from_millis(millis as u64)
    }

    pub fn exhausted(&self, attempt: u32) -> bool {
        matches!(self.max_attempts, Some(max) if attempt >= max)
    }
}
