//! Bootstrap command batch

use super::submitter::{CommandReceipt, CommandSubmitter, SubmitError};
use mdm_shared::bootstrap::{BOOTSTRAP_SEQUENCE, DEVICE_INFORMATION_QUERIES};
use mdm_shared::profile::BootstrapProfile;
use mdm_shared::{CommandRequest, RequestType};
use thiserror::Error;
use tracing::debug;

/// A batch stopped at the first failed submission
#[derive(Error, Debug)]
#[error("Submitting {request_type:?} (command {position} of {total}) for {udid}: {source}")]
pub struct BatchError {
    pub udid: String,
    /// 1-based position of the failed command
    pub position: usize,
    pub total: usize,
    pub request_type: RequestType,
    #[source]
    pub source: SubmitError,
}

/// The ordered bootstrap commands for one device
#[derive(Debug, Clone)]
pub struct CommandBatch {
    udid: String,
    requests: [CommandRequest; BOOTSTRAP_SEQUENCE.len()],
}

impl CommandBatch {
    /// Build the bootstrap sequence for `udid`
    pub fn bootstrap(udid: &str, profile: &BootstrapProfile) -> Self {
        Self {
            udid: udid.to_string(),
            requests: BOOTSTRAP_SEQUENCE.map(|request_type| request_for(request_type, udid, profile)),
        }
    }

    #[cfg(test)]
    pub fn requests(&self) -> &[CommandRequest] {
        &self.requests
    }

    /// Submit every command in order, waiting for each result
    ///
    /// Commands after a failed one are never issued.
    pub async fn submit(self, submitter: &dyn CommandSubmitter) -> Result<Vec<CommandReceipt>, BatchError> {
        let total = self.requests.len();
        let mut receipts = Vec::with_capacity(total);

        for (index, request) in self.requests.into_iter().enumerate() {
            let request_type = request.request_type();

            match submitter.submit(request).await {
                Ok(receipt) => {
                    debug!(
                        udid = %self.udid,
                        command_uuid = %receipt.command_uuid,
                        request_type = receipt.request_type.as_str_name(),
                        "Command submitted"
                    );
                    receipts.push(receipt);
                }
                Err(source) => {
                    return Err(BatchError {
                        udid: self.udid,
                        position: index + 1,
                        total,
                        request_type,
                        source,
                    });
                }
            }
        }

        Ok(receipts)
    }
}

fn request_for(request_type: RequestType, udid: &str, profile: &BootstrapProfile) -> CommandRequest {
    match request_type {
        RequestType::DeviceInformation => {
            CommandRequest::device_information(udid, DEVICE_INFORMATION_QUERIES.iter().copied())
        }
        RequestType::InstallProfile => CommandRequest::install_profile(udid, profile.payload()),
        RequestType::DeviceConfigured => CommandRequest::device_configured(udid),
        RequestType::Unknown => CommandRequest {
            request_type: request_type.into(),
            udid: udid.to_string(),
            ..Default::default()
        },
    }
}
