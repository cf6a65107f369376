//! Closed connections

use tp_protocol::{Message, PlayerId};

use super::GameSession;

impl GameSession {
    /// Remove a closed connection from the pool and the game.
    ///
    /// Broadcasts, in order: the new active turn if the leaver held it, the
    /// leaver's elimination if it was still playing, and `PlayerLeft`.
    pub fn disconnect(&mut self, player: PlayerId) {
        let Some(session) = self.registry.remove(player) else {
            return;
        };
        tracing::info!("{} ({}) disconnected", player, session.address);

        let was_active = self.active_player() == Some(player);
        if self.turn_order.remove(player) && was_active {
            self.announce_turn();
        }

        self.eliminate(player);
        self.registry.send_all(&Message::PlayerLeft { id: player });

        self.cancel_countdown_if_short();
        self.game_over_check();
    }
}
