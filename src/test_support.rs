//! Recording fakes shared by unit tests

use crate::command::{CommandReceipt, CommandSubmitter, SubmitError};
use crate::push::{PushError, PushReceipt, PushService};
use async_trait::async_trait;
use bytes::Bytes;
use mdm_shared::{codec, CheckinCommand, CheckinEvent, CommandRequest, RequestType};
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

/// Encoded Authenticate check-in for `udid`
pub fn authenticate_message(udid: &str) -> Bytes {
    codec::encode_message(&CheckinEvent {
        id: format!("evt-{udid}"),
        command: Some(CheckinCommand {
            message_type: "Authenticate".into(),
            udid: udid.into(),
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Let spawned tasks run until they block, without moving the clock
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

/// Submitter that records accepted commands and can fail at one position
#[derive(Default)]
pub struct RecordingSubmitter {
    /// 1-based call that fails
    fail_at: Option<usize>,
    attempts: Mutex<usize>,
    submitted: Mutex<Vec<CommandRequest>>,
}

impl RecordingSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(position: usize) -> Self {
        Self {
            fail_at: Some(position),
            ..Self::default()
        }
    }

    pub async fn attempts(&self) -> usize {
        *self.attempts.lock().await
    }

    pub async fn submitted(&self) -> Vec<CommandRequest> {
        self.submitted.lock().await.clone()
    }

    pub async fn submitted_types(&self) -> Vec<RequestType> {
        self.submitted
            .lock()
            .await
            .iter()
            .map(CommandRequest::request_type)
            .collect()
    }
}

#[async_trait]
impl CommandSubmitter for RecordingSubmitter {
    async fn submit(&self, request: CommandRequest) -> Result<CommandReceipt, SubmitError> {
        let attempt = {
            let mut attempts = self.attempts.lock().await;
            *attempts += 1;
            *attempts
        };

        if self.fail_at == Some(attempt) {
            return Err(SubmitError::Rejected {
                udid: request.udid,
                reason: "queue offline".into(),
            });
        }

        let request_type = request.request_type();
        self.submitted.lock().await.push(request);
        Ok(CommandReceipt {
            command_uuid: Uuid::new_v4(),
            request_type,
        })
    }
}

/// Push service that records each device and when it was pushed
#[derive(Default)]
pub struct RecordingPushService {
    fail: bool,
    pushes: Mutex<Vec<(String, Instant)>>,
}

impl RecordingPushService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn pushes(&self) -> Vec<(String, Instant)> {
        self.pushes.lock().await.clone()
    }

    pub async fn pushed(&self) -> Vec<String> {
        self.pushes
            .lock()
            .await
            .iter()
            .map(|(udid, _)| udid.clone())
            .collect()
    }
}

#[async_trait]
impl PushService for RecordingPushService {
    async fn push(&self, udid: &str) -> Result<PushReceipt, PushError> {
        if self.fail {
            return Err(PushError::Transport("gateway unavailable".into()));
        }

        self.pushes.lock().await.push((udid.to_string(), Instant::now()));
        Ok(PushReceipt {
            id: Uuid::new_v4(),
            udid: udid.to_string(),
        })
    }
}
