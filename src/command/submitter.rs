//! Command submission capability

use async_trait::async_trait;
use mdm_shared::{CommandRequest, RequestType};
use thiserror::Error;
use uuid::Uuid;

/// Acknowledgement that a command was accepted for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReceipt {
    pub command_uuid: Uuid,
    pub request_type: RequestType,
}

/// Errors returned by a command submitter
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Command rejected for {udid:?}: {reason}")]
    Rejected { udid: String, reason: String },
}

/// Accepts one command request at a time
#[async_trait]
pub trait CommandSubmitter: Send + Sync {
    async fn submit(&self, request: CommandRequest) -> Result<CommandReceipt, SubmitError>;
}
