//! Message types for the tilepath protocol
//!
//! # Message Flow
//!
//! Typical sequence seen by a client:
//!
//! 1. On connect the server sends `Welcome` with the client's id, then a
//!    `PlayerJoined` for every other connected client
//! 2. When a game forms: `Welcome`, `GameStart`, one `PlayerTurn` per
//!    participant in turn order, the active `PlayerTurn`, and (participants
//!    only) `AddTileToHand` for each dealt tile
//! 3. The active player sends `PlaceTile`, or `MoveToken` to choose a
//!    starting side after their first placement
//! 4. The server echoes accepted moves to everyone, followed by any
//!    `MoveToken` updates, `PlayerEliminated` notices and the next `PlayerTurn`
//! 5. `PlayerLeft` announces a closed connection
//!
//! Only `PlaceTile` and `MoveToken` are meaningful from a client; the server
//! ignores every other kind.

use serde::{Deserialize, Serialize};

use crate::ids::{PlayerId, TileId};

/// Message type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Identity assigned to the receiving connection
    Welcome = 0x01,
    /// Another client joined the server
    PlayerJoined = 0x02,
    /// A client left the server
    PlayerLeft = 0x03,
    /// Seconds until the next game starts
    Countdown = 0x04,
    /// A new game is starting
    GameStart = 0x05,
    /// A tile was dealt to the receiving player
    AddTileToHand = 0x06,
    /// Turn announcement
    PlayerTurn = 0x07,
    /// Tile placement
    PlaceTile = 0x08,
    /// Token position (or start-side choice from a client)
    MoveToken = 0x09,
    /// A player lost the game
    PlayerEliminated = 0x0A,
}

impl MessageType {
    /// Convert to u8
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Welcome),
            0x02 => Some(Self::PlayerJoined),
            0x03 => Some(Self::PlayerLeft),
            0x04 => Some(Self::Countdown),
            0x05 => Some(Self::GameStart),
            0x06 => Some(Self::AddTileToHand),
            0x07 => Some(Self::PlayerTurn),
            0x08 => Some(Self::PlaceTile),
            0x09 => Some(Self::MoveToken),
            0x0A => Some(Self::PlayerEliminated),
            _ => None,
        }
    }
}

/// Protocol messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Identity of the receiving connection
    Welcome { id: PlayerId },

    /// Another connection is in the pool
    PlayerJoined {
        /// Display name (`host:port` of the peer)
        name: String,
        id: PlayerId,
    },

    /// A connection closed
    PlayerLeft { id: PlayerId },

    /// Pre-game countdown
    Countdown { seconds: u32 },

    /// A game is starting; clients reset their board
    GameStart,

    /// A tile was added to the receiver's hand
    AddTileToHand { tile: TileId },

    /// It is this player's turn
    PlayerTurn { id: PlayerId },

    /// A tile placed on the board
    PlaceTile {
        id: PlayerId,
        tile: TileId,
        /// Quarter turns, 0..=3
        rotation: u8,
        x: u8,
        y: u8,
    },

    /// A token position; from a client, the choice of starting side
    MoveToken {
        id: PlayerId,
        x: u8,
        y: u8,
        /// Edge point of the cell, 0..=7
        side: u8,
    },

    /// A player is out of the current game
    PlayerEliminated { id: PlayerId },
}

impl Message {
    /// Get the message type for this message
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Welcome { .. } => MessageType::Welcome,
            Message::PlayerJoined { .. } => MessageType::PlayerJoined,
            Message::PlayerLeft { .. } => MessageType::PlayerLeft,
            Message::Countdown { .. } => MessageType::Countdown,
            Message::GameStart => MessageType::GameStart,
            Message::AddTileToHand { .. } => MessageType::AddTileToHand,
            Message::PlayerTurn { .. } => MessageType::PlayerTurn,
            Message::PlaceTile { .. } => MessageType::PlaceTile,
            Message::MoveToken { .. } => MessageType::MoveToken,
            Message::PlayerEliminated { .. } => MessageType::PlayerEliminated,
        }
    }
}
