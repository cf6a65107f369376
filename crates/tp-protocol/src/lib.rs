//! tp-protocol: Wire protocol for the tilepath game server
//!
//! This crate defines the binary protocol spoken between the game server and
//! its clients over plain TCP: the message set, the frame header, and a tokio
//! codec for stream use.

pub mod codec;
pub mod error;
pub mod frame;
pub mod ids;
pub mod message;

pub use codec::{decode, encode, FrameCodec};
pub use error::ProtocolError;
pub use frame::{FrameHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use ids::{PlayerId, TileId};
pub use message::{Message, MessageType};
