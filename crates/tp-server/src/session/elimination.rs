//! Elimination and game-over detection

use tp_protocol::{Message, PlayerId};

use super::{GameSession, Phase};

impl GameSession {
    /// Eliminate every listed player, in order, then check for game over.
    /// Returns true if the game is still running.
    pub(super) fn apply_eliminations(&mut self, eliminated: &[PlayerId]) -> bool {
        for &id in eliminated {
            self.eliminate(id);
        }
        !self.game_over_check()
    }

    /// Move `id` from the remaining set to the eliminated set and take it out
    /// of the rotation. Repeated calls for the same id do nothing.
    pub(super) fn eliminate(&mut self, id: PlayerId) -> bool {
        if !self.in_progress() || !self.remaining.remove(&id) {
            return false;
        }

        tracing::info!("{} eliminated, {} remaining", id, self.remaining.len());
        self.registry.send_all(&Message::PlayerEliminated { id });
        self.eliminated.push(id);
        self.turn_order.remove(id);
        true
    }

    /// End the game once fewer than two players remain, then try to form the
    /// next one. Returns true if the game ended.
    pub(super) fn game_over_check(&mut self) -> bool {
        if !self.in_progress() || self.remaining.len() >= 2 {
            return false;
        }

        match self.remaining.first() {
            Some(winner) => tracing::info!("Game {} over, {} wins", self.games_started, winner),
            None => tracing::info!("Game {} over with no winner", self.games_started),
        }

        self.phase = Phase::Idle;
        self.turn_order.clear();
        self.disarm();
        self.maybe_start_session();
        true
    }
}
