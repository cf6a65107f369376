//! Frame header encoding/decoding
//!
//! The frame format uses a 4-byte header:
//! - message_type: 1 byte (u8)
//! - payload_length: 3 bytes (u24, big-endian)

use bytes::{BufMut, BytesMut};

use crate::error::ProtocolError;
use crate::message::MessageType;

/// Size of the frame header in bytes
pub const HEADER_SIZE: usize = 4;

/// Maximum payload size. Game messages are tiny; anything larger than this
/// is a corrupt or hostile stream.
pub const MAX_PAYLOAD_SIZE: usize = 4096;

/// Frame header carrying the message kind and payload length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Type of message in the payload
    pub message_type: MessageType,
    /// Length of the payload in bytes
    pub payload_length: u32,
}

impl FrameHeader {
    /// Create a new frame header
    pub fn new(message_type: MessageType, payload_length: u32) -> Self {
        Self {
            message_type,
            payload_length,
        }
    }

    /// Total frame length (header plus payload)
    pub fn frame_length(&self) -> usize {
        HEADER_SIZE + self.payload_length as usize
    }

    /// Encode the header into a byte buffer
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_SIZE);
        dst.put_u8(self.message_type.as_u8());
        // payload_length: 3 bytes big-endian (24-bit)
        dst.put_u8((self.payload_length >> 16) as u8);
        dst.put_u16(self.payload_length as u16);
    }

    /// Parse a header from the front of `src` without consuming anything.
    ///
    /// Returns None if there aren't enough bytes in the buffer.
    /// Returns Err if the header is invalid (unknown type, oversized payload).
    pub fn peek(src: &[u8]) -> Result<Option<Self>, ProtocolError> {
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        let message_type =
            MessageType::from_u8(src[0]).ok_or(ProtocolError::UnknownMessageType(src[0]))?;
        let payload_length =
            (u32::from(src[1]) << 16) | (u32::from(src[2]) << 8) | u32::from(src[3]);

        if payload_length as usize > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_length as usize,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Some(Self {
            message_type,
            payload_length,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = FrameHeader::new(MessageType::PlaceTile, 1234);

        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        header.encode(&mut buf);

        assert_eq!(buf.len(), HEADER_SIZE);

        let decoded = FrameHeader::peek(&buf).unwrap().unwrap();
        assert_eq!(decoded, header);
        // peeking leaves the buffer untouched
        assert_eq!(buf.len(), HEADER_SIZE);
    }

    #[test]
    fn test_insufficient_bytes() {
        let result = FrameHeader::peek(&[0x01, 0x00]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_unknown_message_type() {
        let result = FrameHeader::peek(&[0xFE, 0, 0, 10]);
        assert!(matches!(
            result,
            Err(ProtocolError::UnknownMessageType(0xFE))
        ));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let result = FrameHeader::peek(&[MessageType::Welcome.as_u8(), 0x01, 0x00, 0x00]);
        assert!(matches!(
            result,
            Err(ProtocolError::PayloadTooLarge { size: 0x10000, .. })
        ));
    }
}
