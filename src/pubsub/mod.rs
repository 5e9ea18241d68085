//! Event feed plumbing
//!
//! This module handles:
//! - The subscribe/publish capabilities the orchestrator consumes
//! - An in-memory topic broker
//! - A TCP ingest listener feeding framed messages into the broker

mod ingest;
mod inmem;

pub use ingest::IngestListener;
pub use inmem::InMemoryPubSub;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

/// A raw message delivered on a topic
#[derive(Debug, Clone)]
pub struct Event {
    pub topic: String,
    pub message: Bytes,
}

/// Receiving side of a subscription
pub type Subscription = mpsc::Receiver<Event>;

/// Errors raised by the event feed
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Invalid subscription: consumer={consumer:?} topic={topic:?}")]
    InvalidSubscription { consumer: String, topic: String },

    #[error("Consumer {consumer} is already subscribed to {topic}")]
    DuplicateConsumer { consumer: String, topic: String },

    #[error("Cannot publish to an empty topic")]
    EmptyTopic,
}

/// Source of subscribed messages
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Register `consumer` on `topic` and return its message stream
    async fn subscribe(&self, consumer: &str, topic: &str) -> Result<Subscription, FeedError>;
}

/// Sink for published messages
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver `message` to every subscriber of `topic`
    ///
    /// Returns how many subscribers received it.
    async fn publish(&self, topic: &str, message: Bytes) -> Result<usize, FeedError>;
}
