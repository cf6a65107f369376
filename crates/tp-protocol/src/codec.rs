//! Message framing
//!
//! [`encode`] and [`decode`] work on plain byte slices and are what the
//! server's broadcaster and tests use directly. [`FrameCodec`] wraps the same
//! functions for `tokio_util::codec::FramedRead` / `FramedWrite`.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::frame::{FrameHeader, MAX_PAYLOAD_SIZE};
use crate::message::Message;

/// Encode a message into a complete frame
pub fn encode(message: &Message) -> Result<Bytes, ProtocolError> {
    let mut dst = BytesMut::new();
    encode_into(message, &mut dst)?;
    Ok(dst.freeze())
}

fn encode_into(message: &Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
    let payload = bincode::serialize(message)?;
    let payload_len = payload.len();

    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: payload_len,
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let header = FrameHeader::new(message.message_type(), payload_len as u32);
    header.encode(dst);
    dst.extend_from_slice(&payload);

    Ok(())
}

/// Decode one message from the front of `src`.
///
/// Returns `(None, 0)` when `src` does not yet hold a complete frame; the
/// caller keeps the bytes and waits for more input. Otherwise returns the
/// message and the number of bytes it occupied.
pub fn decode(src: &[u8]) -> Result<(Option<Message>, usize), ProtocolError> {
    let Some(header) = FrameHeader::peek(src)? else {
        return Ok((None, 0));
    };

    let frame_len = header.frame_length();
    if src.len() < frame_len {
        return Ok((None, 0));
    }

    let message: Message = bincode::deserialize(&src[crate::frame::HEADER_SIZE..frame_len])?;
    if message.message_type() != header.message_type {
        return Err(ProtocolError::TypeMismatch {
            header: header.message_type,
            payload: message.message_type(),
        });
    }

    Ok((Some(message), frame_len))
}

/// Codec for encoding/decoding protocol frames
#[derive(Debug, Default)]
pub struct FrameCodec;

impl FrameCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for FrameCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let (message, consumed) = decode(&src[..])?;
        if message.is_none() {
            // Reserve room for the rest of the frame if the header is in
            if let Some(header) = FrameHeader::peek(&src[..])? {
                src.reserve(header.frame_length().saturating_sub(src.len()));
            }
            return Ok(None);
        }

        src.advance(consumed);
        tracing::trace!("decoded {:?} ({} bytes)", message, consumed);
        Ok(message)
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_into(&message, dst)
    }
}
