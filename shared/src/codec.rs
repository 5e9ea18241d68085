//! Length-prefixed codec for the ingest socket, plus helpers for feed payloads
//!
//! Ingest frames are laid out as:
//! ```text
//! [ 4 bytes: length (u32, big-endian) ][ N bytes: protobuf PublishRequest ]
//! ```
//!
//! Messages carried on the feed itself are bare protobuf, without a prefix.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use prost::Message;
use thiserror::Error;

use crate::{CheckinEvent, PublishRequest};

/// Maximum frame size (10 MB) to prevent memory exhaustion
pub const MAX_MESSAGE_SIZE: u32 = 10 * 1024 * 1024;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Message too large: {0} bytes (max: {MAX_MESSAGE_SIZE})")]
    MessageTooLarge(usize),

    #[error("Invalid message length prefix: {0}")]
    InvalidLength(u32),

    #[error("Protobuf decode error: {0}")]
    DecodeError(#[from] prost::DecodeError),

    #[error("Protobuf encode error: {0}")]
    EncodeError(#[from] prost::EncodeError),
}

/// Encode a PublishRequest into a length-prefixed frame
pub fn encode(request: &PublishRequest) -> Result<Bytes, CodecError> {
    let mut buf = BytesMut::new();
    encode_into(request, &mut buf)?;
    Ok(buf.freeze())
}

/// Encode a PublishRequest directly into a provided buffer
pub fn encode_into(request: &PublishRequest, buf: &mut BytesMut) -> Result<(), CodecError> {
    let msg_len = request.encoded_len();

    if msg_len > MAX_MESSAGE_SIZE as usize {
        return Err(CodecError::MessageTooLarge(msg_len));
    }

    buf.reserve(4 + msg_len);
    buf.put_u32(msg_len as u32);
    request.encode(buf)?;

    Ok(())
}

/// Try to decode a length-prefixed PublishRequest from a buffer
///
/// Returns:
/// - `Ok(Some(request))` if a complete frame was decoded
/// - `Ok(None)` if more data is needed
/// - `Err(...)` if the data is invalid
pub fn decode(buf: &mut BytesMut) -> Result<Option<PublishRequest>, CodecError> {
    if buf.len() < 4 {
        return Ok(None);
    }

    // Peek at the length prefix without consuming
    let msg_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);

    if msg_len > MAX_MESSAGE_SIZE {
        return Err(CodecError::InvalidLength(msg_len));
    }

    let total_len = 4 + msg_len as usize;
    if buf.len() < total_len {
        return Ok(None);
    }

    buf.advance(4);
    let msg_bytes = buf.split_to(msg_len as usize);
    let request = PublishRequest::decode(msg_bytes)?;

    Ok(Some(request))
}

/// Decode a check-in event published on the feed
pub fn decode_checkin(message: &[u8]) -> Result<CheckinEvent, CodecError> {
    Ok(CheckinEvent::decode(message)?)
}

/// Encode any feed message into a standalone payload
pub fn encode_message<M: Message>(message: &M) -> Bytes {
    Bytes::from(message.encode_to_vec())
}

/// Decode a standalone feed payload
pub fn decode_message<M: Message + Default>(message: &[u8]) -> Result<M, CodecError> {
    Ok(M::decode(message)?)
}

/// Decoder state machine for streaming decoding
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Partial frame data being accumulated
    buffer: BytesMut,
}

impl FrameDecoder {
    /// Create a new frame decoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Add data to the decoder buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next frame from the buffer
    ///
    /// Call this repeatedly until it returns `Ok(None)` to drain all complete frames
    pub fn decode_next(&mut self) -> Result<Option<PublishRequest>, CodecError> {
        decode(&mut self.buffer)
    }

    /// Get the current buffer length
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{topics, CheckinCommand};

    fn authenticate_request(udid: &str) -> PublishRequest {
        let event = CheckinEvent {
            id: "evt-1".into(),
            command: Some(CheckinCommand {
                message_type: "Authenticate".into(),
                udid: udid.into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        PublishRequest {
            topic: topics::AUTHENTICATE.into(),
            message: encode_message(&event),
        }
    }

    #[test]
    fn test_frame_carries_checkin() {
        let encoded = encode(&authenticate_request("udid-1")).expect("encode failed");

        let len_prefix = u32::from_be_bytes([encoded[0], encoded[1], encoded[2], encoded[3]]);
        assert_eq!(len_prefix as usize, encoded.len() - 4);

        let mut buf = BytesMut::from(&encoded[..]);
        let request = decode(&mut buf).expect("decode failed").expect("no frame");
        assert!(buf.is_empty(), "buffer should be empty after decode");
        assert_eq!(request.topic, topics::AUTHENTICATE);

        let event = decode_checkin(&request.message).expect("checkin decode failed");
        assert_eq!(event.udid(), Some("udid-1"));
    }

    #[test]
    fn test_partial_decode() {
        let encoded = encode(&authenticate_request("udid-1")).expect("encode failed");

        let mut buf = BytesMut::from(&encoded[..5]);
        let result = decode(&mut buf).expect("decode should not fail on partial data");
        assert!(result.is_none(), "should return None for partial data");
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_frame_decoder_multiple_frames() {
        let mut decoder = FrameDecoder::new();
        decoder.extend(&encode(&authenticate_request("a")).unwrap());
        decoder.extend(&encode(&authenticate_request("b")).unwrap()[..3]);

        assert!(decoder.decode_next().expect("decode error").is_some());
        assert!(decoder.decode_next().expect("decode error").is_none());
        assert_eq!(decoder.buffer_len(), 3);
    }

    #[test]
    fn test_message_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u32(MAX_MESSAGE_SIZE + 1);
        buf.put_bytes(0, 100);

        let result = decode(&mut buf);
        assert!(matches!(result, Err(CodecError::InvalidLength(_))));
    }

    #[test]
    fn test_garbage_checkin_is_rejected() {
        // Truncated varint
        let result = decode_checkin(&[0xFF, 0xFF, 0xFF]);
        assert!(matches!(result, Err(CodecError::DecodeError(_))));
    }
}
