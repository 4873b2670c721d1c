//! Message bus abstraction.
//!
//! Named-topic publish with at-least-once, unordered delivery. `publish`
//! returns once the bus has accepted the message, not once any consumer has
//! processed it; consumers must therefore tolerate redelivery and must not
//! assume FIFO order per key.
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

pub mod memory;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("topic closed: {0}")]
    Closed(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type BusResult<T> = Result<T, BusError>;

/// A single delivered message. The body is JSON; an empty payload is carried
/// as `{}` rather than zero bytes.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub data: Bytes,
}

#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish a message on a named topic, returning once accepted.
    async fn publish(&self, topic: &str, data: Bytes) -> BusResult<()>;

    /// Subscribe to a named topic. Every subscriber receives every message
    /// published after it subscribed.
    async fn subscribe(&self, topic: &str) -> BusResult<mpsc::UnboundedReceiver<Delivery>>;
}
