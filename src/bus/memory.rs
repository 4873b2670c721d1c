//! In-process implementation of the message bus.
//!
//! Fans every published message out to all live subscribers of the topic
//! over unbounded mpsc channels. Messages published while a topic has no
//! subscriber are dropped; a durable bus would retain them, so production
//! deployments put a real queue behind the [`MessageBus`] trait instead.
use super::{BusResult, Delivery, MessageBus};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

#[derive(Default)]
pub struct InMemoryBus {
    topics: Arc<RwLock<HashMap<String, Vec<mpsc::UnboundedSender<Delivery>>>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, topic: &str, data: Bytes) -> BusResult<()> {
        let mut topics = self.topics.write().await;
        if let Some(subscribers) = topics.get_mut(topic) {
            // Prune subscribers whose receiver side is gone.
            subscribers.retain(|sender| {
                sender
                    .send(Delivery { data: data.clone() })
                    .is_ok()
            });
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> BusResult<mpsc::UnboundedReceiver<Delivery>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.topics
            .write()
            .await
            .entry(topic.to_string())
            .or_default()
            .push(sender);
        Ok(receiver)
    }
}
