//! Game session orchestration
//!
//! [`GameSession`] owns every piece of mutable game state: the connection
//! pool, the board, the turn rotation and the replay logs. Its public methods
//! are the four external events the server reacts to (a connection opening, a
//! message arriving, a connection closing, a timer firing). Each runs to
//! completion synchronously, including every broadcast it causes, so the
//! order of mutations and the order of outbound messages are the same.
//!
//! The transitions are split across submodules by concern:
//!
//! - `scheduler`: forming a game from the pool, countdown, late-join replay
//! - `turns`: placement and token-start handling, forced moves
//! - `elimination`: removing players and detecting game over
//! - `disconnect`: closed connections

mod broadcast;
mod disconnect;
mod elimination;
mod registry;
mod scheduler;
mod turn_order;
mod turns;

pub use registry::{ConnectionRegistry, Hand, Outbound, PlayerSession};
pub use turn_order::TurnOrder;

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::time::Duration;

use rand::rngs::StdRng;
use tokio::time::Instant;

use tp_core::config::GameConfig;
use tp_core::{BoardEngine, Placement, TokenMove};
use tp_protocol::{Message, PlayerId};

use crate::clock::{ClockKind, ClockTicket, TurnClock};

/// Coarse lifecycle of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for enough players
    Idle,
    /// Enough players are present, the countdown is running
    Countdown,
    /// A game is in progress
    Playing,
}

/// All session-mutating state
pub struct GameSession {
    config: GameConfig,
    registry: ConnectionRegistry,
    board: Box<dyn BoardEngine>,
    clock: Box<dyn TurnClock>,
    rng: StdRng,
    phase: Phase,
    turn_order: TurnOrder,
    remaining: BTreeSet<PlayerId>,
    /// In elimination order
    eliminated: Vec<PlayerId>,
    placements: Vec<Placement>,
    token_history: Vec<TokenMove>,
    epoch: u64,
    armed: Option<ClockTicket>,
    countdown_ends: Option<Instant>,
    games_started: u64,
}

impl GameSession {
    /// Create an idle session with an empty pool
    pub fn new(
        config: GameConfig,
        board: Box<dyn BoardEngine>,
        clock: Box<dyn TurnClock>,
        rng: StdRng,
    ) -> Self {
        Self {
            config,
            registry: ConnectionRegistry::new(),
            board,
            clock,
            rng,
            phase: Phase::Idle,
            turn_order: TurnOrder::default(),
            remaining: BTreeSet::new(),
            eliminated: Vec::new(),
            placements: Vec::new(),
            token_history: Vec::new(),
            epoch: 0,
            armed: None,
            countdown_ends: None,
            games_started: 0,
        }
    }

    /// Add a new connection to the pool.
    ///
    /// The newcomer is greeted and told about everyone already pooled, the
    /// others are told about the newcomer. If a game is running the newcomer
    /// gets the replay; during a countdown it gets the time left; otherwise a
    /// game may now be formed.
    ///
    /// Returns `None`, and the connection should be closed, once the id
    /// space is exhausted.
    pub fn connect(&mut self, address: SocketAddr, outbound: Outbound) -> Option<PlayerId> {
        let Some(id) = self.registry.add(address, outbound, self.config.hand_size) else {
            tracing::warn!("No player ids left, refusing {}", address);
            return None;
        };
        tracing::info!("{} connected from {}", id, address);

        self.registry.send_to(id, &Message::Welcome { id });
        let others: Vec<Message> = self
            .registry
            .iter()
            .filter(|session| session.id != id)
            .map(|session| Message::PlayerJoined {
                name: session.name(),
                id: session.id,
            })
            .collect();
        for joined in &others {
            self.registry.send_to(id, joined);
        }
        self.registry.send_others(
            &Message::PlayerJoined {
                name: address.to_string(),
                id,
            },
            id,
        );

        match self.phase {
            Phase::Playing => self.replay_to(id),
            Phase::Countdown => self.send_countdown_to(id),
            Phase::Idle => self.maybe_start_session(),
        }
        Some(id)
    }

    /// React to a decoded message from `player`.
    ///
    /// Anything that is not a legal move for the sender right now is dropped
    /// without a reply.
    pub fn handle_message(&mut self, player: PlayerId, message: Message) {
        if !self.registry.contains(player) {
            tracing::debug!("Message from unknown {}, dropping", player);
            return;
        }
        tracing::trace!("{} sent {:?}", player, message);

        if !self.apply_move(player, &message) {
            tracing::debug!("Dropped {:?} from {}", message.message_type(), player);
        }
    }

    /// A ticket armed earlier has expired
    pub fn on_clock(&mut self, ticket: ClockTicket) {
        if self.armed != Some(ticket) {
            tracing::debug!("Ignoring stale clock ticket {:?}", ticket);
            return;
        }
        self.armed = None;

        match ticket.kind {
            ClockKind::Turn(player) => self.force_move(player),
            ClockKind::Countdown => self.countdown_elapsed(),
        }
    }

    /// Game rules this session runs with
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True while a game is being played
    pub fn in_progress(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// The player whose turn it is
    pub fn active_player(&self) -> Option<PlayerId> {
        if self.in_progress() {
            self.turn_order.active()
        } else {
            None
        }
    }

    /// Rotation of the current game
    pub fn turn_order(&self) -> &TurnOrder {
        &self.turn_order
    }

    /// Participants still in the current game
    pub fn remaining(&self) -> &BTreeSet<PlayerId> {
        &self.remaining
    }

    /// Participants knocked out of the current game, in order
    pub fn eliminated(&self) -> &[PlayerId] {
        &self.eliminated
    }

    /// Every tile placed this game, in order
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Every token move this game, in order
    pub fn token_history(&self) -> &[TokenMove] {
        &self.token_history
    }

    /// The board engine
    pub fn board(&self) -> &dyn BoardEngine {
        self.board.as_ref()
    }

    /// All pooled connections
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Tiles held by `player`
    pub fn hand(&self, player: PlayerId) -> Option<&Hand> {
        self.registry.get(player).map(|session| &session.hand)
    }

    /// Number of pooled connections
    pub fn pool_size(&self) -> usize {
        self.registry.len()
    }

    /// The ticket the session is currently waiting on
    pub fn armed_ticket(&self) -> Option<ClockTicket> {
        self.armed
    }

    /// Number of games formed since startup
    pub fn games_started(&self) -> u64 {
        self.games_started
    }

    fn arm(&mut self, kind: ClockKind, after: Duration) {
        self.epoch += 1;
        let ticket = ClockTicket {
            epoch: self.epoch,
            kind,
            after,
        };
        self.armed = Some(ticket);
        self.clock.arm(ticket);
    }

    fn disarm(&mut self) {
        if self.armed.take().is_some() {
            self.epoch += 1;
            self.clock.disarm();
        }
    }

    fn arm_turn_deadline(&mut self) {
        match self.turn_order.active() {
            Some(active) => self.arm(ClockKind::Turn(active), self.config.turn_timeout),
            None => self.disarm(),
        }
    }

    /// Broadcast whose turn it is and start their deadline
    fn announce_turn(&mut self) {
        if let Some(active) = self.turn_order.active() {
            self.registry.send_all(&Message::PlayerTurn { id: active });
        }
        self.arm_turn_deadline();
    }
}
