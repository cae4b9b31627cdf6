//! Bounded dispatch pool: caps the number of in-flight handler callbacks so
//! a slow or stuck module handler cannot stall the bus reader task (spec
//! §4.1, §5 "Backpressure" — "drop the message and log a warning if the
//! pool is saturated").

use crate::client::Handler;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub struct DispatchPool {
    semaphore: Arc<Semaphore>,
    dropped: Arc<AtomicU64>,
}

impl DispatchPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Total messages dropped so far because the pool was saturated.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Dispatch one message to `handler`, spawning it on a pool worker if a
    /// permit is free. If the pool is saturated the message is dropped and
    /// a warning logged, never blocking the caller.
    pub fn dispatch(&self, subject: String, payload: Vec<u8>, handler: Handler) {
        let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(subject = %subject, "dispatch pool saturated, dropping message");
            return;
        };
        tokio::spawn(async move {
            let _permit = permit;
            handler(&subject, payload);
        });
    }
}
