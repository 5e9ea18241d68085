//! In-process topic broker

use super::{Event, EventFeed, FeedError, Publisher, Subscription};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, trace};

struct Subscriber {
    consumer: String,
    tx: mpsc::Sender<Event>,
}

/// Fans published messages out to every subscriber of a topic
pub struct InMemoryPubSub {
    /// Map of topic -> subscribers
    topics: Arc<RwLock<HashMap<String, Vec<Subscriber>>>>,
    buffer: usize,
}

impl InMemoryPubSub {
    /// Create a broker whose subscriptions buffer up to `buffer` messages each
    pub fn new(buffer: usize) -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    /// Number of live subscribers on a topic
    #[cfg(test)]
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self.topics.read().await;
        topics
            .get(topic)
            .map(|subs| subs.iter().filter(|s| !s.tx.is_closed()).count())
            .unwrap_or(0)
    }
}

impl Default for InMemoryPubSub {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl EventFeed for InMemoryPubSub {
    async fn subscribe(&self, consumer: &str, topic: &str) -> Result<Subscription, FeedError> {
        if consumer.is_empty() || topic.is_empty() {
            return Err(FeedError::InvalidSubscription {
                consumer: consumer.to_string(),
                topic: topic.to_string(),
            });
        }

        let mut topics = self.topics.write().await;
        let subscribers = topics.entry(topic.to_string()).or_default();

        // A dropped receiver frees its consumer name
        subscribers.retain(|s| !s.tx.is_closed());
        if subscribers.iter().any(|s| s.consumer == consumer) {
            return Err(FeedError::DuplicateConsumer {
                consumer: consumer.to_string(),
                topic: topic.to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(self.buffer);
        subscribers.push(Subscriber {
            consumer: consumer.to_string(),
            tx,
        });

        debug!(consumer, topic, "Subscribed");
        Ok(rx)
    }
}

#[async_trait]
impl Publisher for InMemoryPubSub {
    async fn publish(&self, topic: &str, message: Bytes) -> Result<usize, FeedError> {
        if topic.is_empty() {
            return Err(FeedError::EmptyTopic);
        }

        let targets: Vec<(String, mpsc::Sender<Event>)> = {
            let topics = self.topics.read().await;
            match topics.get(topic) {
                Some(subs) => subs
                    .iter()
                    .map(|s| (s.consumer.clone(), s.tx.clone()))
                    .collect(),
                None => Vec::new(),
            }
        };

        if targets.is_empty() {
            trace!(topic, "No subscribers for topic");
            return Ok(0);
        }

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (consumer, tx) in targets {
            let event = Event {
                topic: topic.to_string(),
                message: message.clone(),
            };
            match tx.send(event).await {
                Ok(()) => delivered += 1,
                Err(_) => closed.push(consumer),
            }
        }

        if !closed.is_empty() {
            let mut topics = self.topics.write().await;
            if let Some(subs) = topics.get_mut(topic) {
                subs.retain(|s| !closed.contains(&s.consumer) || !s.tx.is_closed());
            }
            debug!(topic, removed = closed.len(), "Pruned closed subscribers");
        }

        Ok(delivered)
    }
}
