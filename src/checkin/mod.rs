//! Check-in event decoding
//!
//! Turns a raw message received on the authenticate topic into the small
//! event the orchestrator works with.

use mdm_shared::codec::{self, CodecError};
use mdm_shared::AUTHENTICATE_MESSAGE_TYPE;
use thiserror::Error;

/// A device that just authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationEvent {
    pub udid: String,
    pub serial_number: String,
    pub event_id: String,
    pub topic: String,
}

/// Why a subscribed message could not be turned into an event
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed check-in: {0}")]
    Malformed(#[from] CodecError),

    #[error("Check-in has no command section")]
    MissingCommand,

    #[error("Check-in has no device identifier")]
    MissingDeviceId,

    #[error("Unexpected check-in message type: {0}")]
    UnexpectedMessageType(String),
}

/// Decodes subscribed messages into authentication events
pub trait CheckinDecoder: Send + Sync {
    fn decode(&self, message: &[u8]) -> Result<AuthenticationEvent, DecodeError>;
}

/// Decoder for protobuf-encoded check-in events
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtobufCheckinDecoder;

impl CheckinDecoder for ProtobufCheckinDecoder {
    fn decode(&self, message: &[u8]) -> Result<AuthenticationEvent, DecodeError> {
        let event = codec::decode_checkin(message)?;
        let command = event.command.as_ref().ok_or(DecodeError::MissingCommand)?;

        if !command.message_type.is_empty() && command.message_type != AUTHENTICATE_MESSAGE_TYPE {
            return Err(DecodeError::UnexpectedMessageType(command.message_type.clone()));
        }

        let udid = event.udid().ok_or(DecodeError::MissingDeviceId)?;

        Ok(AuthenticationEvent {
            udid: udid.to_string(),
            serial_number: command.serial_number.clone(),
            event_id: event.id.clone(),
            topic: command.topic.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdm_shared::{CheckinCommand, CheckinEvent};

    fn encode(message_type: &str, udid: &str) -> bytes::Bytes {
        codec::encode_message(&CheckinEvent {
            id: "evt-42".into(),
            command: Some(CheckinCommand {
                message_type: message_type.into(),
                topic: "com.apple.mgmt.External.test".into(),
                udid: udid.into(),
                serial_number: "C02XK0AAJG5H".into(),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    #[test]
    fn test_decode_authenticate() {
        let event = ProtobufCheckinDecoder
            .decode(&encode("Authenticate", "UDID-1"))
            .unwrap();
        assert_eq!(
            event,
            AuthenticationEvent {
                udid: "UDID-1".into(),
                serial_number: "C02XK0AAJG5H".into(),
                event_id: "evt-42".into(),
                topic: "com.apple.mgmt.External.test".into(),
            }
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = ProtobufCheckinDecoder.decode(&[0xFF, 0xFF, 0xFF]);
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_requires_command_and_udid() {
        let empty = codec::encode_message(&CheckinEvent::default());
        assert!(matches!(
            ProtobufCheckinDecoder.decode(&empty),
            Err(DecodeError::MissingCommand)
        ));

        assert!(matches!(
            ProtobufCheckinDecoder.decode(&encode("Authenticate", "")),
            Err(DecodeError::MissingDeviceId)
        ));
    }

    #[test]
    fn test_decode_rejects_other_message_types() {
        let result = ProtobufCheckinDecoder.decode(&encode("TokenUpdate", "UDID-1"));
        assert!(matches!(result, Err(DecodeError::UnexpectedMessageType(t)) if t == "TokenUpdate"));
    }
}
