//! The tile catalogue
//!
//! A tile is a square with two connection points on each edge, eight in all,
//! joined pairwise by four paths. Points are numbered around the square:
//!
//! ```text
//!        5   4
//!      +-------+
//!    6 |       | 3
//!    7 |       | 2
//!      +-------+
//!        0   1
//! ```
//!
//! 0-1 face `y + 1`, 2-3 face `x + 1`, 4-5 face `y - 1`, 6-7 face `x - 1`.
//! Rotating a tile by one quarter turn shifts every point by two.
//!
//! The catalogue is every distinct way of pairing the eight points, with
//! pairings that are rotations of each other counted once: 35 tiles.

use rand::Rng;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use tp_protocol::TileId;

/// Connection points per tile
pub const EDGE_POINTS: u8 = 8;

/// Distinct rotations of a tile
pub const ROTATIONS: u8 = 4;

const UNPAIRED: u8 = u8::MAX;

/// Path layout of one tile in its unrotated orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tile {
    links: [u8; EDGE_POINTS as usize],
}

impl Tile {
    /// The point joined to `point` in the unrotated tile
    pub fn link(&self, point: u8) -> u8 {
        self.links[(point % EDGE_POINTS) as usize]
    }

    /// Where a token entering at `entry` leaves the tile when it is placed
    /// with `rotation` quarter turns
    pub fn exit(&self, rotation: u8, entry: u8) -> u8 {
        let shift = 2 * (rotation % ROTATIONS);
        let base_entry = (entry % EDGE_POINTS + EDGE_POINTS - shift) % EDGE_POINTS;
        (self.links[base_entry as usize] + shift) % EDGE_POINTS
    }

    fn rotated(&self, rotation: u8) -> Tile {
        let shift = 2 * (rotation % ROTATIONS);
        let mut links = [0; EDGE_POINTS as usize];
        for point in 0..EDGE_POINTS {
            links[((point + shift) % EDGE_POINTS) as usize] =
                (self.links[point as usize] + shift) % EDGE_POINTS;
        }
        Tile { links }
    }
}

/// The neighbouring cell offset across `point`, and the point a token arrives
/// on in that neighbour
pub fn across(point: u8) -> (i8, i8, u8) {
    match point % EDGE_POINTS {
        0 => (0, 1, 5),
        1 => (0, 1, 4),
        2 => (1, 0, 7),
        3 => (1, 0, 6),
        4 => (0, -1, 1),
        5 => (0, -1, 0),
        6 => (-1, 0, 3),
        _ => (-1, 0, 2),
    }
}

/// All tiles, indexed by [`TileId`]
pub fn catalogue() -> &'static [Tile] {
    static CATALOGUE: OnceLock<Vec<Tile>> = OnceLock::new();
    CATALOGUE.get_or_init(build_catalogue)
}

/// Look up a tile
pub fn tile(id: TileId) -> Option<&'static Tile> {
    catalogue().get(id.index())
}

/// Number of tiles in the catalogue
pub fn tile_count() -> usize {
    catalogue().len()
}

/// Draw a tile uniformly at random. Tiles are drawn with replacement.
pub fn random_tile<R: Rng + ?Sized>(rng: &mut R) -> TileId {
    TileId::new(rng.gen_range(0..tile_count()) as u8)
}

fn build_catalogue() -> Vec<Tile> {
    let mut pairings = Vec::new();
    pair_up(&mut [UNPAIRED; EDGE_POINTS as usize], &mut pairings);

    let mut seen = BTreeSet::new();
    let mut tiles = Vec::new();
    for links in pairings {
        let tile = Tile { links };
        let canonical = (1..ROTATIONS)
            .map(|r| tile.rotated(r))
            .fold(tile, |best, candidate| best.min(candidate));
        if seen.insert(canonical) {
            tiles.push(canonical);
        }
    }

    tracing::trace!("built tile catalogue with {} tiles", tiles.len());
    tiles
}

fn pair_up(links: &mut [u8; EDGE_POINTS as usize], out: &mut Vec<[u8; EDGE_POINTS as usize]>) {
    let Some(first) = links.iter().position(|&l| l == UNPAIRED) else {
        out.push(*links);
        return;
    };

    for other in first + 1..EDGE_POINTS as usize {
        if links[other] == UNPAIRED {
            links[first] = other as u8;
            links[other] = first as u8;
            pair_up(links, out);
            links[first] = UNPAIRED;
            links[other] = UNPAIRED;
        }
    }
}
