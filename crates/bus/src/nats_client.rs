//! Real bus transport backed by `async-nats`.
//!
//! Grounded on `original_source/agent/agent.py`'s `NatsClient`: connect with
//! callbacks for the disconnect/reconnect/error lifecycle events, drain on
//! shutdown rather than a hard close. `async-nats` re-establishes
//! subscriptions transparently across a reconnect, so there is no
//! re-subscribe bookkeeping here beyond what the client already does.

use crate::client::{BusClient, BusError, Handler, Subscription};
use crate::pool::DispatchPool;
use crate::reconnect::ReconnectPolicy;
use async_nats::Client;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Messages in flight to handler callbacks, capped to bound memory use
/// under a slow consumer (spec §5 "Backpressure").
const DEFAULT_DISPATCH_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct NatsBusClient {
    inner: Arc<Inner>,
}

struct Inner {
    client: Client,
    pool: DispatchPool,
    next_sub_id: AtomicU64,
}

impl NatsBusClient {
    pub async fn connect(servers: &str, name: &str, _policy: ReconnectPolicy) -> Result<Self, BusError> {
        let client = async_nats::ConnectOptions::new()
            .name(name)
            .event_callback(|event| async move {
                match event {
                    async_nats::Event::Disconnected => {
                        tracing::warn!("bus connection lost, reconnecting");
                    }
                    async_nats::Event::Connected => {
                        tracing::info!("bus connection (re)established");
                    }
                    async_nats::Event::ClientError(err) => {
                        tracing::error!(error = %err, "bus client error");
                    }
                    _ => {}
                }
            })
            .connect(servers)
            .await
            .map_err(|err| BusError::Unavailable(err.to_string()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                pool: DispatchPool::new(DEFAULT_DISPATCH_CAPACITY),
                next_sub_id: AtomicU64::new(0),
            }),
        })
    }

    /// Count of messages dropped for pool saturation since connect.
    pub fn dropped_count(&self) -> u64 {
        self.inner.pool.dropped_count()
    }
}

#[async_trait]
impl BusClient for NatsBusClient {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.inner
            .client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|err| BusError::Unavailable(err.to_string()))
    }

    async fn subscribe(&self, subject: &str, handler: Handler) -> Result<Subscription, BusError> {
        let mut subscriber = self
            .inner
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|err| BusError::Unavailable(err.to_string()))?;

        let id = self.inner.next_sub_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                let subject = message.subject.to_string();
                let payload = message.payload.to_vec();
                inner.pool.dispatch(subject, payload, Arc::clone(&handler));
            }
        });

        Ok(Subscription(id))
    }

    async fn drain(&self) -> Result<(), BusError> {
        self.inner
            .client
            .drain()
            .await
            .map_err(|err| BusError::Unavailable(err.to_string()))
    }
}
