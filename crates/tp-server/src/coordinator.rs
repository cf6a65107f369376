//! Serialized access to the game session
//!
//! The `GameCoordinator` is the single mutual-exclusion domain of the server.
//! Connection handlers and the clock task never touch [`GameSession`]
//! directly; every event they deliver takes the lock for the whole
//! transition, including the broadcasts it causes.
//!
//! # Atomicity Model
//!
//! Each method acquires the lock once and runs one synchronous session
//! transition under it. Transitions that trigger further transitions (an
//! elimination ending the game and forming the next one) are plain method
//! calls on the already locked session, so the lock never needs to be taken
//! twice. Outbound frames are queued, not written, under the lock, so a slow
//! peer cannot stall other players.

use std::net::SocketAddr;

use tokio::sync::{Mutex, MutexGuard};

use tp_protocol::{Message, PlayerId};

use crate::clock::ClockTicket;
use crate::session::{GameSession, Outbound};

/// Owns the game session and serializes every event delivered to it.
pub struct GameCoordinator {
    inner: Mutex<GameSession>,
}

impl GameCoordinator {
    /// Wrap a session
    pub fn new(session: GameSession) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Register a freshly accepted connection
    pub async fn connect(&self, address: SocketAddr, outbound: Outbound) -> Option<PlayerId> {
        self.inner.lock().await.connect(address, outbound)
    }

    /// Deliver a decoded message from `player`
    pub async fn handle_message(&self, player: PlayerId, message: Message) {
        self.inner.lock().await.handle_message(player, message);
    }

    /// Tear down a closed connection
    pub async fn disconnect(&self, player: PlayerId) {
        self.inner.lock().await.disconnect(player);
    }

    /// Deliver an expired clock ticket
    pub async fn on_clock(&self, ticket: ClockTicket) {
        self.inner.lock().await.on_clock(ticket);
    }

    /// Acquire the session lock directly.
    ///
    /// Useful for inspecting state in tests and diagnostics; the guard must
    /// not be held across a call to any other coordinator method.
    pub async fn lock(&self) -> MutexGuard<'_, GameSession> {
        self.inner.lock().await
    }
}
