//! Push capability

use crate::pubsub::{FeedError, Publisher};
use async_trait::async_trait;
use mdm_shared::{codec, PushNotification};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Identifies a push request handed to the push transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReceipt {
    pub id: Uuid,
    pub udid: String,
}

/// Errors returned by a push service
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Cannot push without a device identifier")]
    MissingDeviceId,

    #[error("No push gateway subscribed to {topic}")]
    NoSubscribers { topic: String },

    #[error("Push transport failed: {0}")]
    Transport(String),
}

impl From<FeedError> for PushError {
    fn from(err: FeedError) -> Self {
        PushError::Transport(err.to_string())
    }
}

/// Notifies a device that it has commands waiting
#[async_trait]
pub trait PushService: Send + Sync {
    async fn push(&self, udid: &str) -> Result<PushReceipt, PushError>;
}

/// Publishes push requests on a topic for the push gateway to deliver
pub struct PubSubPushService {
    publisher: Arc<dyn Publisher>,
    topic: String,
}

impl PubSubPushService {
    pub fn new(publisher: Arc<dyn Publisher>, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl PushService for PubSubPushService {
    async fn push(&self, udid: &str) -> Result<PushReceipt, PushError> {
        if udid.is_empty() {
            return Err(PushError::MissingDeviceId);
        }

        let notification = PushNotification::new(udid);
        let delivered = self
            .publisher
            .publish(&self.topic, codec::encode_message(&notification))
            .await?;
        if delivered == 0 {
            return Err(PushError::NoSubscribers {
                topic: self.topic.clone(),
            });
        }

        let receipt = PushReceipt {
            id: Uuid::new_v4(),
            udid: udid.to_string(),
        };
        debug!(udid, push_id = %receipt.id, topic = %self.topic, delivered, "Push requested");
        Ok(receipt)
    }
}
