//! Delayed push scheduling

use super::service::{PushError, PushReceipt, PushService};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// How a scheduled push ended
#[derive(Debug)]
pub enum PushOutcome {
    Delivered(PushReceipt),
    Failed(PushError),
    /// Shutdown arrived before the delay elapsed
    Cancelled,
}

/// Errors raised when a push cannot be scheduled
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("{limit} pushes already pending")]
    AtCapacity { limit: usize },
}

/// Fires one push per device after a fixed delay
///
/// Pending pushes are capped; each task holds a permit until its push call
/// returns or it is cancelled.
pub struct PushScheduler {
    service: Arc<dyn PushService>,
    delay: Duration,
    permits: Arc<Semaphore>,
    limit: usize,
    shutdown: CancellationToken,
}

impl PushScheduler {
    pub fn new(
        service: Arc<dyn PushService>,
        delay: Duration,
        max_pending: usize,
        shutdown: CancellationToken,
    ) -> Self {
        // Configuration rejects values outside this range
        let limit = max_pending.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            service,
            delay,
            permits: Arc::new(Semaphore::new(limit)),
            limit,
            shutdown,
        }
    }

    /// Number of pushes waiting to fire or in flight
    pub fn pending(&self) -> usize {
        self.limit - self.permits.available_permits()
    }

    /// Schedule a push for `udid` without waiting for it
    pub fn schedule(&self, udid: String) -> Result<JoinHandle<PushOutcome>, ScheduleError> {
        let permit = self
            .permits
            .clone()
            .try_acquire_owned()
            .map_err(|_| ScheduleError::AtCapacity { limit: self.limit })?;

        let service = self.service.clone();
        let shutdown = self.shutdown.clone();
        // Measured from scheduling, not from when the task is first polled
        let fire_at = Instant::now() + self.delay;

        debug!(%udid, delay_ms = self.delay.as_millis() as u64, "Push scheduled");

        Ok(tokio::spawn(async move {
            let _permit = permit;

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!(%udid, "Push cancelled before firing");
                    return PushOutcome::Cancelled;
                }
                _ = tokio::time::sleep_until(fire_at) => {}
            }

            match service.push(&udid).await {
                Ok(receipt) => {
                    info!(udid = %receipt.udid, push_id = %receipt.id, "Push sent");
                    PushOutcome::Delivered(receipt)
                }
                Err(e) => {
                    error!(%udid, error = %e, "Push failed");
                    PushOutcome::Failed(e)
                }
            }
        }))
    }
}
