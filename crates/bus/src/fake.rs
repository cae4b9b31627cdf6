//! In-memory bus fake for coordinator/agent tests, grounded on the
//! `FakeNotifyAdapter` pattern (recorded calls behind a mutex, `Clone` is
//! a handle to shared state).

use crate::client::{BusClient, BusError, Handler, Subscription};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub subject: String,
    pub payload: Vec<u8>,
}

struct State {
    published: Vec<PublishedMessage>,
    subscribers: HashMap<String, Vec<Handler>>,
}

/// A fake [`BusClient`] that loops published messages straight back to any
/// matching subscriber in-process, synchronously, with no network and no
/// subject wildcards. Every clone shares the same underlying state, same as
/// a real connected client handle.
#[derive(Clone)]
pub struct FakeBusClient {
    state: Arc<Mutex<State>>,
    next_sub_id: Arc<AtomicU64>,
}

impl Default for FakeBusClient {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(State { published: Vec::new(), subscribers: HashMap::new() })),
            next_sub_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl FakeBusClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages published so far, in order.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state.lock().published.clone()
    }

    pub fn published_to(&self, subject: &str) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .published
            .iter()
            .filter(|m| m.subject == subject)
            .map(|m| m.payload.clone())
            .collect()
    }

    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.state.lock().subscribers.get(subject).map_or(0, Vec::len)
    }
}

#[async_trait]
impl BusClient for FakeBusClient {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        let handlers = {
            let mut state = self.state.lock();
            state.published.push(PublishedMessage { subject: subject.to_string(), payload: payload.clone() });
            state.subscribers.get(subject).cloned().unwrap_or_default()
        };
        for handler in handlers {
            handler(subject, payload.clone());
        }
        Ok(())
    }

    async fn subscribe(&self, subject: &str, handler: Handler) -> Result<Subscription, BusError> {
        self.state.lock().subscribers.entry(subject.to_string()).or_default().push(handler);
        let id = self.next_sub_id.fetch_add(1, Ordering::Relaxed);
        Ok(Subscription(id))
    }

    async fn drain(&self) -> Result<(), BusError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
