//! Bootstrap orchestrator
//!
//! Subscribes once to authenticate check-ins and, for every event, decodes it,
//! submits the bootstrap command batch for the device and schedules a delayed
//! push once the whole batch was accepted. Decoding and submission run inside
//! the loop one event at a time; only the push is handed off.

use crate::checkin::CheckinDecoder;
use crate::command::{CommandBatch, CommandSubmitter};
use crate::pubsub::{Event, EventFeed, FeedError, Subscription};
use crate::push::{PushScheduler, PushService};
use mdm_shared::profile::BootstrapProfile;
use mdm_shared::{bootstrap, topics};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Consumer identity on the event feed
    pub consumer_name: String,
    /// Topic carrying authenticate check-ins
    pub topic: String,
    /// Delay between batch success and push
    pub push_delay: Duration,
    /// Cap on delayed pushes waiting to fire
    pub max_pending_pushes: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            consumer_name: bootstrap::CONSUMER_NAME.into(),
            topic: topics::AUTHENTICATE.into(),
            push_delay: Duration::from_millis(bootstrap::PUSH_DELAY_MS),
            max_pending_pushes: bootstrap::MAX_PENDING_PUSHES,
        }
    }
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Subscribing {consumer} to {topic}: {source}")]
    Subscribe {
        consumer: String,
        topic: String,
        #[source]
        source: FeedError,
    },
}

/// Capabilities the orchestrator drives
#[derive(Clone)]
pub struct Collaborators {
    pub decoder: Arc<dyn CheckinDecoder>,
    pub submitter: Arc<dyn CommandSubmitter>,
    pub push: Arc<dyn PushService>,
}

/// What happened to one subscribed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The message was not a usable authenticate check-in
    Undecodable,
    /// A command in the batch was rejected; no push
    BatchFailed { udid: String },
    /// All commands accepted and a push is pending
    PushScheduled { udid: String },
    /// All commands accepted but the pending-push cap was reached
    PushRejected { udid: String },
}

/// Event-processing actor for the bootstrap flow
pub struct BootstrapOrchestrator {
    subscription: Subscription,
    decoder: Arc<dyn CheckinDecoder>,
    submitter: Arc<dyn CommandSubmitter>,
    profile: BootstrapProfile,
    scheduler: PushScheduler,
    shutdown: CancellationToken,
}

impl BootstrapOrchestrator {
    /// Subscribe to the authenticate topic
    ///
    /// Subscription failure is returned as-is; there is no retry.
    pub async fn subscribe(
        feed: &dyn EventFeed,
        config: &OrchestratorConfig,
        collaborators: Collaborators,
        profile: BootstrapProfile,
        shutdown: CancellationToken,
    ) -> Result<Self, OrchestratorError> {
        let subscription = feed
            .subscribe(&config.consumer_name, &config.topic)
            .await
            .map_err(|source| OrchestratorError::Subscribe {
                consumer: config.consumer_name.clone(),
                topic: config.topic.clone(),
                source,
            })?;

        info!(
            consumer = %config.consumer_name,
            topic = %config.topic,
            push_delay_ms = config.push_delay.as_millis() as u64,
            "Subscribed to authenticate events"
        );

        let scheduler = PushScheduler::new(
            collaborators.push,
            config.push_delay,
            config.max_pending_pushes,
            shutdown.child_token(),
        );

        Ok(Self {
            subscription,
            decoder: collaborators.decoder,
            submitter: collaborators.submitter,
            profile,
            scheduler,
            shutdown,
        })
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &PushScheduler {
        &self.scheduler
    }

    /// Consume events until cancelled or the feed closes
    ///
    /// Cancellation is observed between events; an event already being
    /// handled finishes first.
    pub async fn run(mut self) {
        info!("Bootstrap orchestrator started");

        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Received shutdown signal, stopping orchestrator");
                    break;
                }
                event = self.subscription.recv() => match event {
                    Some(event) => event,
                    None => {
                        warn!("Event feed closed, stopping orchestrator");
                        break;
                    }
                },
            };

            self.handle_event(&event).await;
        }

        info!(
            pending_pushes = self.scheduler.pending(),
            "Bootstrap orchestrator stopped"
        );
    }

    /// Process one subscribed message
    pub async fn handle_event(&self, event: &Event) -> EventOutcome {
        let auth = match self.decoder.decode(&event.message) {
            Ok(auth) => auth,
            Err(e) => {
                warn!(topic = %event.topic, error = %e, "Dropping undecodable check-in");
                return EventOutcome::Undecodable;
            }
        };

        let udid = auth.udid;
        debug!(%udid, event_id = %auth.event_id, "Device authenticated");

        let batch = CommandBatch::bootstrap(&udid, &self.profile);
        match batch.submit(self.submitter.as_ref()).await {
            Ok(receipts) => {
                info!(%udid, commands = receipts.len(), "Bootstrap commands queued");
            }
            Err(e) => {
                error!(%udid, position = e.position, error = %e, "Bootstrap batch failed");
                return EventOutcome::BatchFailed { udid };
            }
        }

        match self.scheduler.schedule(udid.clone()) {
            Ok(_) => EventOutcome::PushScheduled { udid },
            Err(e) => {
                error!(%udid, error = %e, "Push not scheduled");
                EventOutcome::PushRejected { udid }
            }
        }
    }
}
