//! Core domain types

use tp_protocol::{Message, PlayerId, TileId};

/// Where a token sits: a cell and one of its eight edge points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenPosition {
    pub x: u8,
    pub y: u8,
    /// Edge point, 0..=7
    pub side: u8,
}

impl TokenPosition {
    /// Create a new position
    pub fn new(x: u8, y: u8, side: u8) -> Self {
        Self { x, y, side }
    }

    /// The cell this position is on
    pub fn cell(&self) -> (u8, u8) {
        (self.x, self.y)
    }
}

/// A token position update produced by movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMove {
    pub player: PlayerId,
    pub position: TokenPosition,
}

impl TokenMove {
    /// The broadcast form of this update
    pub fn to_message(&self) -> Message {
        Message::MoveToken {
            id: self.player,
            x: self.position.x,
            y: self.position.y,
            side: self.position.side,
        }
    }
}

/// A tile placed on the board by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub player: PlayerId,
    pub tile: TileId,
    pub rotation: u8,
    pub x: u8,
    pub y: u8,
}

impl Placement {
    /// The broadcast form of this placement
    pub fn to_message(&self) -> Message {
        Message::PlaceTile {
            id: self.player,
            tile: self.tile,
            rotation: self.rotation,
            x: self.x,
            y: self.y,
        }
    }
}

/// Result of running token movement after a board change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementOutcome {
    /// Final positions of every token that moved, in movement order
    pub moves: Vec<TokenMove>,
    /// Tokens that left the board, in the order they did so
    pub eliminated: Vec<PlayerId>,
}

impl MovementOutcome {
    /// True when nothing moved and nobody was eliminated
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.eliminated.is_empty()
    }
}
