//! Wire messages exchanged over the event feed and the ingest socket.

use bytes::Bytes;
use std::collections::HashMap;

/// Command section of a device check-in
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckinCommand {
    #[prost(string, tag = "1")]
    pub message_type: String,

    #[prost(string, tag = "2")]
    pub topic: String,

    #[prost(string, tag = "3")]
    pub udid: String,

    #[prost(string, tag = "4")]
    pub serial_number: String,

    #[prost(string, tag = "5")]
    pub model: String,

    #[prost(string, tag = "6")]
    pub os_version: String,
}

/// A check-in event as published by the check-in service
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CheckinEvent {
    #[prost(string, tag = "1")]
    pub id: String,

    #[prost(uint64, tag = "2")]
    pub time_ms: u64,

    #[prost(message, optional, tag = "3")]
    pub command: Option<CheckinCommand>,

    #[prost(map = "string, string", tag = "4")]
    pub params: HashMap<String, String>,

    /// Raw plist body sent by the device
    #[prost(bytes = "bytes", tag = "5")]
    pub raw: Bytes,
}

/// MDM command request types issued by the server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum RequestType {
    Unknown = 0,
    DeviceInformation = 1,
    InstallProfile = 2,
    DeviceConfigured = 3,
}

impl RequestType {
    /// Name of the request type as it appears in the MDM protocol
    pub fn as_str_name(&self) -> &'static str {
        match self {
            RequestType::Unknown => "Unknown",
            RequestType::DeviceInformation => "DeviceInformation",
            RequestType::InstallProfile => "InstallProfile",
            RequestType::DeviceConfigured => "DeviceConfigured",
        }
    }
}

/// A command queued for delivery to one device
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommandRequest {
    #[prost(enumeration = "RequestType", tag = "1")]
    pub request_type: i32,

    #[prost(string, tag = "2")]
    pub udid: String,

    /// Only used by DeviceInformation
    #[prost(string, repeated, tag = "3")]
    pub queries: Vec<String>,

    /// Only used by InstallProfile
    #[prost(bytes = "bytes", optional, tag = "4")]
    pub payload: Option<Bytes>,
}

/// Frame body accepted by the ingest listener
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PublishRequest {
    #[prost(string, tag = "1")]
    pub topic: String,

    #[prost(bytes = "bytes", tag = "2")]
    pub message: Bytes,
}

/// Published when the server wants a device to check in for pending commands
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PushNotification {
    #[prost(string, tag = "1")]
    pub udid: String,

    #[prost(uint64, tag = "2")]
    pub requested_at_ms: u64,
}
