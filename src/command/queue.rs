//! In-memory per-device command queue

use super::submitter::{CommandReceipt, CommandSubmitter, SubmitError};
use async_trait::async_trait;
use mdm_shared::{bootstrap, now_ms, CommandRequest, RequestType};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// A command waiting for its device to fetch it
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub command_uuid: Uuid,
    pub request: CommandRequest,
    pub queued_at: u64,
}

/// Holds accepted commands until each device asks for them
///
/// Each device keeps at most `max_per_device` commands; the oldest are dropped
/// to make room, so a re-enrolling device always gets its newest batch.
pub struct InMemoryCommandQueue {
    /// Map of udid -> commands, oldest first
    queues: Arc<RwLock<HashMap<String, VecDeque<QueuedCommand>>>>,
    max_per_device: usize,
}

impl InMemoryCommandQueue {
    pub fn new(max_per_device: usize) -> Self {
        Self {
            queues: Arc::new(RwLock::new(HashMap::new())),
            max_per_device: max_per_device.max(1),
        }
    }

    /// Pending commands for a device, oldest first
    #[cfg(test)]
    pub async fn pending_for(&self, udid: &str) -> Vec<QueuedCommand> {
        self.queues
            .read()
            .await
            .get(udid)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub async fn pending_count(&self) -> usize {
        self.queues.read().await.values().map(VecDeque::len).sum()
    }
}

impl Default for InMemoryCommandQueue {
    fn default() -> Self {
        Self::new(bootstrap::MAX_QUEUED_PER_DEVICE)
    }
}

#[async_trait]
impl CommandSubmitter for InMemoryCommandQueue {
    async fn submit(&self, request: CommandRequest) -> Result<CommandReceipt, SubmitError> {
        if request.udid.is_empty() {
            return Err(SubmitError::Rejected {
                udid: request.udid,
                reason: "missing device identifier".into(),
            });
        }

        let request_type = request.request_type();
        if request_type == RequestType::Unknown {
            return Err(SubmitError::Rejected {
                udid: request.udid,
                reason: format!("unsupported request type {}", request.request_type),
            });
        }

        let command_uuid = Uuid::new_v4();
        let udid = request.udid.clone();
        let command = QueuedCommand {
            command_uuid,
            request,
            queued_at: now_ms(),
        };

        let mut queues = self.queues.write().await;
        let queue = queues.entry(udid.clone()).or_default();
        while queue.len() >= self.max_per_device {
            if let Some(stale) = queue.pop_front() {
                warn!(
                    %udid,
                    command_uuid = %stale.command_uuid,
                    request_type = stale.request.request_type().as_str_name(),
                    queued_at = stale.queued_at,
                    "Dropping stale command"
                );
            }
        }
        queue.push_back(command);
        drop(queues);

        debug!(%udid, %command_uuid, request_type = request_type.as_str_name(), "Command queued");

        Ok(CommandReceipt {
            command_uuid,
            request_type,
        })
    }
}
