//! Forming games from the pool

use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::time::Instant;

use tp_core::tiles;
use tp_protocol::{Message, PlayerId};

use super::{GameSession, Phase, TurnOrder};
use crate::clock::ClockKind;

impl GameSession {
    /// Start a game, or the countdown to one, if the pool allows it
    pub(super) fn maybe_start_session(&mut self) {
        if self.phase != Phase::Idle || self.registry.len() < 2 {
            return;
        }

        if self.config.countdown.is_zero() {
            self.start_session();
            return;
        }

        let seconds = whole_seconds(self.config.countdown);
        tracing::info!("{} players waiting, game starts in {}s", self.registry.len(), seconds);
        self.phase = Phase::Countdown;
        self.countdown_ends = Some(Instant::now() + self.config.countdown);
        self.registry.send_all(&Message::Countdown { seconds });
        self.arm(ClockKind::Countdown, self.config.countdown);
    }

    /// Tell a connection that joined mid-countdown how long is left
    pub(super) fn send_countdown_to(&self, player: PlayerId) {
        let Some(ends) = self.countdown_ends else {
            return;
        };
        let seconds = whole_seconds(ends.saturating_duration_since(Instant::now()));
        self.registry.send_to(player, &Message::Countdown { seconds });
    }

    pub(super) fn countdown_elapsed(&mut self) {
        if self.phase != Phase::Countdown {
            return;
        }
        self.phase = Phase::Idle;
        self.countdown_ends = None;

        if self.registry.len() >= 2 {
            self.start_session();
        } else {
            tracing::info!("Countdown finished without enough players");
        }
    }

    /// Stop a running countdown once the pool can no longer form a game
    pub(super) fn cancel_countdown_if_short(&mut self) {
        if self.phase == Phase::Countdown && self.registry.len() < 2 {
            tracing::info!("Not enough players left, countdown cancelled");
            self.disarm();
            self.phase = Phase::Idle;
            self.countdown_ends = None;
        }
    }

    fn start_session(&mut self) {
        self.disarm();
        self.countdown_ends = None;

        let mut pool = self.registry.ids();
        let size = self.config.player_limit.min(pool.len());
        let (chosen, _) = pool.partial_shuffle(&mut self.rng, size);
        let participants = chosen.to_vec();

        self.turn_order = TurnOrder::new(participants.clone());
        self.remaining = participants.iter().copied().collect();
        self.eliminated.clear();
        self.placements.clear();
        self.token_history.clear();
        self.board.reset();
        for session in self.registry.iter_mut() {
            session.hand.clear();
        }
        self.phase = Phase::Playing;
        self.games_started += 1;

        tracing::info!(
            "Starting game {} with {} of {} players, order {:?}",
            self.games_started,
            participants.len(),
            self.registry.len(),
            participants
        );

        for id in self.registry.ids() {
            self.registry.send_to(id, &Message::Welcome { id });
        }
        self.registry.send_all(&Message::GameStart);
        for &id in &participants {
            self.registry.send_all(&Message::PlayerTurn { id });
        }
        if let Some(active) = self.turn_order.active() {
            self.registry.send_all(&Message::PlayerTurn { id: active });
        }

        for &id in &participants {
            self.deal(id);
        }

        self.arm_turn_deadline();
    }

    fn deal(&mut self, player: PlayerId) {
        for _ in 0..self.config.hand_size {
            let tile = tiles::random_tile(&mut self.rng);
            if let Some(session) = self.registry.get_mut(player) {
                session.hand.push(tile);
            }
            self.registry.send_to(player, &Message::AddTileToHand { tile });
        }
    }

    /// Bring a connection that arrived mid-game up to date
    pub(super) fn replay_to(&self, player: PlayerId) {
        tracing::debug!(
            "Replaying {} placements and {} token moves to {}",
            self.placements.len(),
            self.token_history.len(),
            player
        );

        for placement in &self.placements {
            self.registry.send_to(player, &placement.to_message());
        }
        for update in &self.token_history {
            self.registry.send_to(player, &update.to_message());
        }
        for &id in &self.eliminated {
            self.registry.send_to(player, &Message::PlayerEliminated { id });
        }
        for &id in self.turn_order.as_slice() {
            self.registry.send_to(player, &Message::PlayerTurn { id });
        }
        if let Some(active) = self.turn_order.active() {
            self.registry.send_to(player, &Message::PlayerTurn { id: active });
        }
    }
}

/// Seconds announced to clients, rounded up so a running countdown never
/// reads zero
fn whole_seconds(duration: Duration) -> u32 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}
