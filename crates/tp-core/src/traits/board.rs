//! Board engine trait

use tp_protocol::{PlayerId, TileId};

use crate::types::{MovementOutcome, TokenPosition};

/// The narrow contract the session orchestrator drives the board through.
///
/// Every mutating call either applies fully and returns `true`, or leaves
/// the board untouched and returns `false`.
pub trait BoardEngine: Send {
    /// Clear all tiles and token positions
    fn reset(&mut self);

    /// Place `tile` at `(x, y)` on behalf of `player`.
    ///
    /// A player without a token may place exactly one tile, on an empty
    /// border cell. A player with a token may only place on the token's cell.
    fn set_tile(&mut self, x: u8, y: u8, tile: TileId, rotation: u8, player: PlayerId) -> bool;

    /// Whether `player` has chosen a starting side yet
    fn have_player_position(&self, player: PlayerId) -> bool;

    /// Put `player`'s token on `side` of their first tile at `(x, y)`
    fn set_player_start_position(&mut self, player: PlayerId, x: u8, y: u8, side: u8) -> bool;

    /// Current token position of `player`
    fn get_player_position(&self, player: PlayerId) -> Option<TokenPosition>;

    /// Advance every listed token along the paths now reachable from it
    fn do_player_movement(&mut self, players: &[PlayerId]) -> MovementOutcome;

    /// The cell of the first tile `player` placed, if any
    fn player_start_tile(&self, player: PlayerId) -> Option<(u8, u8)>;

    /// Border cells with no tile on them
    fn empty_border_cells(&self) -> Vec<(u8, u8)>;

    /// Edge points of `(x, y)` that face out of the board
    fn start_sides(&self, x: u8, y: u8) -> Vec<u8>;
}
