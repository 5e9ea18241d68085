//! MDM Bootstrap Shared Types
//!
//! This crate provides the wire messages, frame codec and the static bootstrap
//! profile shared by the bootstrap server and its feed producers.

pub mod codec;
pub mod profile;
pub mod proto;

use bytes::Bytes;
use std::time::{SystemTime, UNIX_EPOCH};

// Re-export commonly used types at crate root
pub use proto::*;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Pub/sub topic names
pub mod topics {
    /// Devices that completed an Authenticate check-in
    pub const AUTHENTICATE: &str = "mdm.Authenticate";

    /// Push notifications requested by the server
    pub const PUSH_REQUESTED: &str = "mdm.PushRequested";
}

/// Bootstrap policy defaults
pub mod bootstrap {
    use crate::RequestType;

    /// Consumer identity used when subscribing to authenticate events
    pub const CONSUMER_NAME: &str = "bootstrap-dep";

    /// Delay between a successful batch and the push notification
    pub const PUSH_DELAY_MS: u64 = 10_000;

    /// Maximum number of delayed pushes waiting to fire
    pub const MAX_PENDING_PUSHES: usize = 1024;

    /// Commands kept per device before the oldest are dropped
    pub const MAX_QUEUED_PER_DEVICE: usize = 16;

    /// Queries sent with the DeviceInformation command
    pub const DEVICE_INFORMATION_QUERIES: &[&str] = &["UDID"];

    /// Commands every newly authenticated device receives, in order
    pub const BOOTSTRAP_SEQUENCE: [RequestType; 3] = [
        RequestType::DeviceInformation,
        RequestType::InstallProfile,
        RequestType::DeviceConfigured,
    ];
}

/// The check-in message type handled by the bootstrap flow
pub const AUTHENTICATE_MESSAGE_TYPE: &str = "Authenticate";

impl CommandRequest {
    /// Build a DeviceInformation query
    pub fn device_information<I, S>(udid: impl Into<String>, queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            request_type: RequestType::DeviceInformation.into(),
            udid: udid.into(),
            queries: queries.into_iter().map(Into::into).collect(),
            payload: None,
        }
    }

    /// Build an InstallProfile command carrying a configuration profile
    pub fn install_profile(udid: impl Into<String>, payload: Bytes) -> Self {
        Self {
            request_type: RequestType::InstallProfile.into(),
            udid: udid.into(),
            queries: Vec::new(),
            payload: Some(payload),
        }
    }

    /// Build a DeviceConfigured command releasing the device from Setup Assistant
    pub fn device_configured(udid: impl Into<String>) -> Self {
        Self {
            request_type: RequestType::DeviceConfigured.into(),
            udid: udid.into(),
            queries: Vec::new(),
            payload: None,
        }
    }
}

impl CheckinEvent {
    /// Device identifier of the check-in, if present
    pub fn udid(&self) -> Option<&str> {
        self.command
            .as_ref()
            .map(|c| c.udid.as_str())
            .filter(|udid| !udid.is_empty())
    }
}

impl PushNotification {
    /// Create a push request for a device, stamped with the current time
    pub fn new(udid: impl Into<String>) -> Self {
        Self {
            udid: udid.into(),
            requested_at_ms: now_ms(),
        }
    }
}
