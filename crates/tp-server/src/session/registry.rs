//! The player pool

use std::collections::BTreeMap;
use std::net::SocketAddr;

use bytes::Bytes;
use tokio::sync::mpsc;

use tp_protocol::{PlayerId, TileId};

/// Queue of encoded frames waiting to be written to one connection
pub type Outbound = mpsc::UnboundedSender<Bytes>;

/// Tiles held by one player, in the order they were drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hand {
    tiles: Vec<TileId>,
    capacity: usize,
}

impl Hand {
    /// Create an empty hand holding at most `capacity` tiles
    pub fn new(capacity: usize) -> Self {
        Self {
            tiles: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn tiles(&self) -> &[TileId] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tiles.len() >= self.capacity
    }

    pub fn contains(&self, tile: TileId) -> bool {
        self.tiles.contains(&tile)
    }

    /// Add a tile; returns false if the hand is already full
    pub fn push(&mut self, tile: TileId) -> bool {
        if self.is_full() {
            return false;
        }
        self.tiles.push(tile);
        true
    }

    /// Remove one copy of `tile`; returns false if it was not held
    pub fn take(&mut self, tile: TileId) -> bool {
        match self.tiles.iter().position(|&t| t == tile) {
            Some(index) => {
                self.tiles.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

/// One connected client
#[derive(Debug)]
pub struct PlayerSession {
    /// Identity, fixed for the life of the connection
    pub id: PlayerId,
    /// Peer address
    pub address: SocketAddr,
    /// Tiles held in the current game; empty for spectators
    pub hand: Hand,
    outbound: Outbound,
}

impl PlayerSession {
    /// Display name announced to other clients
    pub fn name(&self) -> String {
        self.address.to_string()
    }

    /// Whether the connection's writer is still accepting frames
    pub fn is_live(&self) -> bool {
        !self.outbound.is_closed()
    }

    pub(super) fn outbound(&self) -> &Outbound {
        &self.outbound
    }
}

/// All connected clients, participants and spectators alike
#[derive(Debug)]
pub struct ConnectionRegistry {
    players: BTreeMap<PlayerId, PlayerSession>,
    /// `None` once every id has been handed out
    next_id: Option<PlayerId>,
}

impl ConnectionRegistry {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            players: BTreeMap::new(),
            next_id: Some(PlayerId::new(0)),
        }
    }

    /// Insert a new connection under the next unused id.
    ///
    /// Returns `None` without inserting when the id space is exhausted; ids
    /// are never reused.
    pub fn add(
        &mut self,
        address: SocketAddr,
        outbound: Outbound,
        hand_size: usize,
    ) -> Option<PlayerId> {
        let id = self.next_id?;
        self.next_id = id.checked_next();

        self.players.insert(
            id,
            PlayerSession {
                id,
                address,
                hand: Hand::new(hand_size),
                outbound,
            },
        );
        Some(id)
    }

    #[cfg(test)]
    pub(crate) fn set_next_id(&mut self, next: PlayerId) {
        self.next_id = Some(next);
    }

    /// Drop a connection from the pool
    pub fn remove(&mut self, id: PlayerId) -> Option<PlayerSession> {
        self.players.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&PlayerSession> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut PlayerSession> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    /// Pooled ids in ascending (connection) order
    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerSession> {
        self.players.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlayerSession> {
        self.players.values_mut()
    }

    /// Number of pooled connections
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Check if pool is empty
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
