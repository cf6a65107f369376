//! Grid board and token path simulation

use std::collections::{HashMap, HashSet};

use tp_protocol::{PlayerId, TileId};

use crate::tiles::{self, across, EDGE_POINTS, ROTATIONS};
use crate::traits::BoardEngine;
use crate::types::{MovementOutcome, TokenMove, TokenPosition};

/// Board width in cells
pub const BOARD_WIDTH: u8 = 5;

/// Board height in cells
pub const BOARD_HEIGHT: u8 = 5;

/// A tile sitting on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedTile {
    pub tile: TileId,
    pub rotation: u8,
    pub placed_by: PlayerId,
}

/// The game board
#[derive(Debug, Clone)]
pub struct Board {
    width: u8,
    height: u8,
    cells: Vec<Option<PlacedTile>>,
    positions: HashMap<PlayerId, TokenPosition>,
    /// Tokens that left the board; they never move again
    off_board: HashSet<PlayerId>,
}

impl Board {
    /// Create an empty board of the standard size
    pub fn new() -> Self {
        Self::with_size(BOARD_WIDTH, BOARD_HEIGHT)
    }

    /// Create an empty board of the given size
    pub fn with_size(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
            positions: HashMap::new(),
            off_board: HashSet::new(),
        }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// The tile at `(x, y)`, if any
    pub fn tile_at(&self, x: u8, y: u8) -> Option<PlacedTile> {
        self.index(x, y).and_then(|i| self.cells[i])
    }

    fn index(&self, x: u8, y: u8) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    fn is_border(&self, x: u8, y: u8) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    fn has_placed_tile(&self, player: PlayerId) -> bool {
        self.cells
            .iter()
            .flatten()
            .any(|cell| cell.placed_by == player)
    }

    /// The cell reached by moving `(dx, dy)` from `(x, y)`, or None off the edge
    fn offset(&self, x: u8, y: u8, dx: i8, dy: i8) -> Option<(u8, u8)> {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        self.index(nx, ny).map(|_| (nx, ny))
    }

    /// Follow paths from `start` until the token reaches an empty cell or
    /// leaves the board. Returns the final position and whether it left.
    fn trace_path(&self, start: TokenPosition) -> (TokenPosition, bool) {
        let mut position = start;
        // Every path segment is traversed at most once
        for _ in 0..self.cells.len() * EDGE_POINTS as usize {
            let Some(placed) = self.tile_at(position.x, position.y) else {
                return (position, false);
            };
            let Some(tile) = tiles::tile(placed.tile) else {
                return (position, false);
            };

            let exit = tile.exit(placed.rotation, position.side);
            let (dx, dy, arrival) = across(exit);
            match self.offset(position.x, position.y, dx, dy) {
                Some((nx, ny)) => position = TokenPosition::new(nx, ny, arrival),
                None => return (TokenPosition::new(position.x, position.y, exit), true),
            }
        }

        tracing::warn!("token path from {:?} did not terminate", start);
        (position, false)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardEngine for Board {
    fn reset(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = None);
        self.positions.clear();
        self.off_board.clear();
    }

    fn set_tile(&mut self, x: u8, y: u8, tile: TileId, rotation: u8, player: PlayerId) -> bool {
        let Some(index) = self.index(x, y) else {
            return false;
        };
        if tiles::tile(tile).is_none() || rotation >= ROTATIONS || self.cells[index].is_some() {
            return false;
        }
        if self.off_board.contains(&player) {
            return false;
        }

        match self.positions.get(&player) {
            Some(position) => {
                if position.cell() != (x, y) {
                    return false;
                }
            }
            None => {
                // First tile goes on the border, and only one before choosing a side
                if !self.is_border(x, y) || self.has_placed_tile(player) {
                    return false;
                }
            }
        }

        self.cells[index] = Some(PlacedTile {
            tile,
            rotation,
            placed_by: player,
        });
        true
    }

    fn have_player_position(&self, player: PlayerId) -> bool {
        self.positions.contains_key(&player)
    }

    fn set_player_start_position(&mut self, player: PlayerId, x: u8, y: u8, side: u8) -> bool {
        if self.positions.contains_key(&player) {
            return false;
        }
        match self.tile_at(x, y) {
            Some(placed) if placed.placed_by == player => {}
            _ => return false,
        }
        if !self.start_sides(x, y).contains(&side) {
            return false;
        }

        self.positions
            .insert(player, TokenPosition::new(x, y, side));
        true
    }

    fn get_player_position(&self, player: PlayerId) -> Option<TokenPosition> {
        self.positions.get(&player).copied()
    }

    fn do_player_movement(&mut self, players: &[PlayerId]) -> MovementOutcome {
        let mut outcome = MovementOutcome::default();

        for &player in players {
            if self.off_board.contains(&player) {
                continue;
            }
            let Some(start) = self.positions.get(&player).copied() else {
                continue;
            };

            let (position, left_board) = self.trace_path(start);
            if position != start || left_board {
                self.positions.insert(player, position);
                outcome.moves.push(TokenMove { player, position });
            }
            if left_board {
                self.off_board.insert(player);
                outcome.eliminated.push(player);
            }
        }

        outcome
    }

    fn player_start_tile(&self, player: PlayerId) -> Option<(u8, u8)> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .find(|&(x, y)| matches!(self.tile_at(x, y), Some(placed) if placed.placed_by == player))
    }

    fn empty_border_cells(&self) -> Vec<(u8, u8)> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.is_border(x, y) && self.tile_at(x, y).is_none())
            .collect()
    }

    fn start_sides(&self, x: u8, y: u8) -> Vec<u8> {
        if self.index(x, y).is_none() {
            return Vec::new();
        }

        let mut sides = Vec::with_capacity(4);
        if x == 0 {
            sides.extend([7, 6]);
        }
        if y == 0 {
            sides.extend([5, 4]);
        }
        if x + 1 == self.width {
            sides.extend([3, 2]);
        }
        if y + 1 == self.height {
            sides.extend([1, 0]);
        }
        sides
    }
}
