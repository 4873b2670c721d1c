//! Command pipeline: publisher and consumer.
//!
//! # Purpose
//! Turns validated HTTP mutations into asynchronous messages and, on the
//! consumer side, applies them to the document store. Each command type owns
//! a fixed topic. Delivery is at-least-once: update and remove are naturally
//! idempotent (merge/replace/delete by id), but a redelivered add inserts a
//! duplicate document. That gap is deliberate; there is no dedup key here.
use crate::bus::{BusError, BusResult, Delivery, MessageBus};
use crate::model::{ProductFields, RemoveCommand, UpdateCommand};
use crate::store::{DocumentStore, StoreError};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

pub const TOPIC_PRODUCT_ADD: &str = "product-add";
pub const TOPIC_PRODUCT_UPDATE: &str = "product-update";
pub const TOPIC_PRODUCT_REMOVE: &str = "product-remove";

/// Serializes mutation intents and hands them to the bus. Fire-and-forget:
/// each method returns once the bus accepts the message.
pub struct CommandPublisher {
    bus: Arc<dyn MessageBus>,
}

impl CommandPublisher {
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        Self { bus }
    }

    pub async fn publish_add(&self, fields: &ProductFields) -> BusResult<()> {
        self.publish(TOPIC_PRODUCT_ADD, fields).await
    }

    pub async fn publish_update(
        &self,
        id: &str,
        fields: ProductFields,
        partial_update: bool,
    ) -> BusResult<()> {
        let command = UpdateCommand {
            id: id.to_string(),
            partial_update,
            fields,
        };
        self.publish(TOPIC_PRODUCT_UPDATE, &command).await
    }

    pub async fn publish_remove(&self, id: &str) -> BusResult<()> {
        let command = RemoveCommand { id: id.to_string() };
        self.publish(TOPIC_PRODUCT_REMOVE, &command).await
    }

    async fn publish<T: Serialize>(&self, topic: &str, command: &T) -> BusResult<()> {
        let payload = serde_json::to_vec(command).map_err(anyhow::Error::from)?;
        self.bus.publish(topic, Bytes::from(payload)).await
    }
}

/// The consumer's subscriptions to the three command topics.
///
/// Taken separately from [`CommandConsumer::run`] so callers can subscribe
/// before the API starts acknowledging mutations; an in-process bus drops
/// messages published into a topic that has no subscriber yet.
pub struct CommandStreams {
    add: mpsc::UnboundedReceiver<Delivery>,
    update: mpsc::UnboundedReceiver<Delivery>,
    remove: mpsc::UnboundedReceiver<Delivery>,
}

impl CommandStreams {
    pub async fn subscribe(bus: &dyn MessageBus) -> Result<Self, BusError> {
        Ok(Self {
            add: bus.subscribe(TOPIC_PRODUCT_ADD).await?,
            update: bus.subscribe(TOPIC_PRODUCT_UPDATE).await?,
            remove: bus.subscribe(TOPIC_PRODUCT_REMOVE).await?,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error("malformed command payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Applies delivered commands to the document store.
pub struct CommandConsumer {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl CommandConsumer {
    pub fn new(store: Arc<dyn DocumentStore>, collection: &str) -> Self {
        Self {
            store,
            collection: collection.to_string(),
        }
    }

    /// Insert the payload's fields as a new document. The assigned id is
    /// discarded; there is no correlation back to the HTTP caller.
    pub async fn handle_add(&self, payload: &[u8]) -> Result<(), ConsumeError> {
        let fields: ProductFields = serde_json::from_slice(payload)?;
        let _ = self
            .store
            .insert(&self.collection, fields.into_document())
            .await?;
        Ok(())
    }

    /// Apply an update. Deserialization already separates `id` and
    /// `partialUpdate` from the field map, so neither is ever written into
    /// the document.
    pub async fn handle_update(&self, payload: &[u8]) -> Result<(), ConsumeError> {
        let command: UpdateCommand = serde_json::from_slice(payload)?;
        self.store
            .update(
                &self.collection,
                &command.id,
                command.fields.into_document(),
                command.partial_update,
            )
            .await?;
        Ok(())
    }

    pub async fn handle_remove(&self, payload: &[u8]) -> Result<(), ConsumeError> {
        let command: RemoveCommand = serde_json::from_slice(payload)?;
        self.store.delete(&self.collection, &command.id).await?;
        Ok(())
    }

    /// Process deliveries from the subscribed streams until the bus closes.
    /// Handler failures are logged and the loop keeps going; an
    /// at-least-once bus will redeliver what matters.
    pub async fn run(self: Arc<Self>, streams: CommandStreams) {
        let CommandStreams {
            mut add,
            mut update,
            mut remove,
        } = streams;

        loop {
            tokio::select! {
                delivery = add.recv() => match delivery {
                    Some(delivery) => {
                        if let Err(err) = self.handle_add(&delivery.data).await {
                            tracing::error!(topic = TOPIC_PRODUCT_ADD, error = %err, "command failed");
                        }
                    }
                    None => break,
                },
                delivery = update.recv() => match delivery {
                    Some(delivery) => {
                        if let Err(err) = self.handle_update(&delivery.data).await {
                            tracing::error!(topic = TOPIC_PRODUCT_UPDATE, error = %err, "command failed");
                        }
                    }
                    None => break,
                },
                delivery = remove.recv() => match delivery {
                    Some(delivery) => {
                        if let Err(err) = self.handle_remove(&delivery.data).await {
                            tracing::error!(topic = TOPIC_PRODUCT_REMOVE, error = %err, "command failed");
                        }
                    }
                    None => break,
                },
            }
        }
    }
}
