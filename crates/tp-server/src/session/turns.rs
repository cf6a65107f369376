//! The turn loop
//!
//! A participant is in one of three sub-states, derived from the board rather
//! than stored: no tile placed yet (must place on an empty border cell), first
//! tile placed but no token (must choose a start side on it), or token on the
//! board (must place on the token's cell). Client moves and forced moves go
//! through the same [`GameSession::apply_move`] path.

use rand::seq::SliceRandom;
use rand::Rng;

use tp_core::tiles::{self, ROTATIONS};
use tp_core::{Placement, TokenPosition};
use tp_protocol::{Message, PlayerId};

use super::GameSession;

impl GameSession {
    /// Try to apply `message` as a move by `sender`. Returns true if accepted.
    pub(super) fn apply_move(&mut self, sender: PlayerId, message: &Message) -> bool {
        match *message {
            Message::PlaceTile {
                id,
                tile,
                rotation,
                x,
                y,
            } => self.place_tile(
                sender,
                Placement {
                    player: id,
                    tile,
                    rotation,
                    x,
                    y,
                },
            ),
            Message::MoveToken { id, x, y, side } => {
                self.start_token(sender, id, TokenPosition::new(x, y, side))
            }
            Message::Welcome { .. }
            | Message::PlayerJoined { .. }
            | Message::PlayerLeft { .. }
            | Message::Countdown { .. }
            | Message::GameStart
            | Message::AddTileToHand { .. }
            | Message::PlayerTurn { .. }
            | Message::PlayerEliminated { .. } => false,
        }
    }

    fn is_active(&self, player: PlayerId) -> bool {
        self.in_progress() && self.turn_order.active() == Some(player)
    }

    fn place_tile(&mut self, sender: PlayerId, placement: Placement) -> bool {
        if !self.is_active(sender) || placement.player != sender {
            return false;
        }
        let holds_tile = self
            .registry
            .get(sender)
            .is_some_and(|session| session.hand.contains(placement.tile));
        if !holds_tile {
            return false;
        }
        if !self.board.set_tile(
            placement.x,
            placement.y,
            placement.tile,
            placement.rotation,
            sender,
        ) {
            return false;
        }

        self.registry.send_all(&placement.to_message());
        self.placements.push(placement);

        if !self.resolve_movement() {
            return true;
        }

        let fresh = tiles::random_tile(&mut self.rng);
        if let Some(session) = self.registry.get_mut(sender) {
            session.hand.take(placement.tile);
            session.hand.push(fresh);
        }
        self.registry
            .send_to(sender, &Message::AddTileToHand { tile: fresh });

        self.finish_turn(sender);
        true
    }

    fn start_token(&mut self, sender: PlayerId, id: PlayerId, position: TokenPosition) -> bool {
        if !self.is_active(sender) || id != sender {
            return false;
        }
        if self.board.have_player_position(sender) {
            return false;
        }
        if !self
            .board
            .set_player_start_position(sender, position.x, position.y, position.side)
        {
            return false;
        }

        if self.resolve_movement() {
            self.finish_turn(sender);
        }
        true
    }

    /// Move every remaining token and apply the eliminations that result.
    /// Returns false if the game ended.
    fn resolve_movement(&mut self) -> bool {
        let players = self.turn_order.as_slice().to_vec();
        let outcome = self.board.do_player_movement(&players);

        for update in &outcome.moves {
            self.registry.send_all(&update.to_message());
            self.token_history.push(*update);
        }
        self.apply_eliminations(&outcome.eliminated)
    }

    fn finish_turn(&mut self, actor: PlayerId) {
        // An actor eliminated by their own move is already out of the rotation
        self.turn_order.rotate_to_back(actor);
        self.announce_turn();
    }

    /// The turn deadline of `player` expired
    pub(super) fn force_move(&mut self, player: PlayerId) {
        if !self.is_active(player) {
            return;
        }
        tracing::info!("{} timed out, moving for them", player);

        let accepted = match self.synthesize_move(player) {
            Some(message) => {
                tracing::debug!("Forced move for {}: {:?}", player, message);
                self.apply_move(player, &message)
            }
            None => false,
        };

        if !accepted {
            tracing::info!("{} has no legal move, eliminating", player);
            self.eliminate(player);
            if !self.game_over_check() {
                self.announce_turn();
            }
        }
    }

    /// A random legal move for `player`'s current sub-state
    fn synthesize_move(&mut self, player: PlayerId) -> Option<Message> {
        let hand = self.registry.get(player)?.hand.tiles().to_vec();

        if let Some(position) = self.board.get_player_position(player) {
            let tile = *hand.choose(&mut self.rng)?;
            return Some(Message::PlaceTile {
                id: player,
                tile,
                rotation: 0,
                x: position.x,
                y: position.y,
            });
        }

        if let Some((x, y)) = self.board.player_start_tile(player) {
            let side = *self.board.start_sides(x, y).choose(&mut self.rng)?;
            return Some(Message::MoveToken {
                id: player,
                x,
                y,
                side,
            });
        }

        let (x, y) = *self.board.empty_border_cells().choose(&mut self.rng)?;
        let tile = *hand.choose(&mut self.rng)?;
        let rotation = self.rng.gen_range(0..ROTATIONS);
        Some(Message::PlaceTile {
            id: player,
            tile,
            rotation,
            x,
            y,
        })
    }
}

#[cfg(test)]
mod tests {
    use tp_core::{MovementOutcome, TokenMove};
    use tp_protocol::TileId;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::super::test_support::*;
    use super::super::Hand;
    use super::*;

    /// Upper bound on transitions in one game: one per board cell plus a
    /// start side and an elimination per participant, with slack
    const GAME_STEP_BOUND: usize = 100;

    fn check_hands(session: &GameSession) {
        if !session.in_progress() {
            return;
        }
        for &id in session.turn_order().as_slice() {
            assert_eq!(
                session.hand(id).map(Hand::len),
                Some(session.config().hand_size),
                "{} hand size drifted",
                id
            );
        }
    }

    #[test]
    fn test_placement_broadcast_exchange_and_rotation() {
        let mut session = session(config(4), 21);
        let mut clients = vec![connect(&mut session, 1000), connect(&mut session, 1001)];
        drain_all(&mut clients);

        let actor = session.active_player().unwrap();
        let other = session.turn_order().as_slice()[1];
        let before = session.hand(actor).unwrap().clone();
        let placement = first_placement(&session, actor);
        let Message::PlaceTile { tile, .. } = placement else {
            unreachable!()
        };

        session.handle_message(actor, placement.clone());

        let hand = session.hand(actor).unwrap();
        assert_eq!(hand.len(), before.len());
        let to_actor = client_mut(&mut clients, actor).drain();
        let Message::AddTileToHand { tile: fresh } = to_actor[1] else {
            panic!("expected a replacement tile, got {:?}", to_actor);
        };
        assert_eq!(
            to_actor,
            vec![
                placement.clone(),
                Message::AddTileToHand { tile: fresh },
                Message::PlayerTurn { id: other },
            ]
        );
        assert!(hand.contains(fresh));
        let held_before = before.tiles().iter().filter(|&&t| t == tile).count();
        let held_after = hand.tiles().iter().filter(|&&t| t == tile).count();
        assert_eq!(held_after + 1 - usize::from(fresh == tile), held_before);

        assert_eq!(
            client_mut(&mut clients, other).drain(),
            vec![placement, Message::PlayerTurn { id: other }]
        );
        assert_eq!(session.active_player(), Some(other));
        assert_eq!(session.placements().len(), 1);
        check_invariants(&session);
    }

    #[test]
    fn test_wrong_actor_and_bad_requests_are_dropped() {
        let mut session = session(config(4), 22);
        let mut clients = vec![connect(&mut session, 1000), connect(&mut session, 1001)];
        drain_all(&mut clients);

        let actor = session.active_player().unwrap();
        let other = session.turn_order().as_slice()[1];
        let ticket = session.armed_ticket();

        // Not their turn
        let out_of_turn = first_placement(&session, other);
        session.handle_message(other, out_of_turn);

        // Someone else's id
        let Message::PlaceTile { tile, x, y, .. } = first_placement(&session, actor) else {
            unreachable!()
        };
        session.handle_message(
            actor,
            Message::PlaceTile {
                id: other,
                tile,
                rotation: 0,
                x,
                y,
            },
        );

        // Tile not in hand
        let missing = (0..35u8)
            .map(TileId::new)
            .find(|t| !session.hand(actor).unwrap().contains(*t))
            .unwrap();
        session.handle_message(
            actor,
            Message::PlaceTile {
                id: actor,
                tile: missing,
                rotation: 0,
                x,
                y,
            },
        );

        // Interior cell on a first move
        session.handle_message(
            actor,
            Message::PlaceTile {
                id: actor,
                tile,
                rotation: 0,
                x: 2,
                y: 2,
            },
        );

        // Token before any tile
        session.handle_message(
            actor,
            Message::MoveToken {
                id: actor,
                x: 0,
                y: 0,
                side: 7,
            },
        );

        assert_eq!(session.active_player(), Some(actor));
        assert_eq!(session.armed_ticket(), ticket);
        assert!(session.placements().is_empty());
        assert!(clients.iter_mut().all(|c| c.drain().is_empty()));
    }

    #[test]
    fn test_occupied_cell_is_dropped() {
        let mut session = session(config(4), 23);
        let mut clients = vec![connect(&mut session, 1000), connect(&mut session, 1001)];
        drain_all(&mut clients);

        let first = session.active_player().unwrap();
        let Message::PlaceTile { x, y, .. } = first_placement(&session, first) else {
            unreachable!()
        };
        let placement = first_placement(&session, first);
        session.handle_message(first, placement);
        drain_all(&mut clients);

        let second = session.active_player().unwrap();
        let tile = session.hand(second).unwrap().tiles()[0];
        session.handle_message(
            second,
            Message::PlaceTile {
                id: second,
                tile,
                rotation: 0,
                x,
                y,
            },
        );

        assert_eq!(session.active_player(), Some(second));
        assert!(clients.iter_mut().all(|c| c.drain().is_empty()));
    }

    #[test]
    fn test_start_token_moves_and_rotates() {
        let mut session = session(config(2), 24);
        let mut clients = vec![connect(&mut session, 1000), connect(&mut session, 1001)];

        let a = session.active_player().unwrap();
        let b = session.turn_order().as_slice()[1];
        for player in [a, b] {
            let placement = first_placement(&session, player);
            session.handle_message(player, placement);
        }
        drain_all(&mut clients);
        assert_eq!(session.active_player(), Some(a));

        let (x, y) = session.board().player_start_tile(a).unwrap();
        let side = session.board().start_sides(x, y)[0];
        session.handle_message(a, Message::MoveToken { id: a, x, y, side });

        // The start tile is under the token, so it always travels
        assert_eq!(session.token_history().len(), 1);
        let update = session.token_history()[0];
        assert_eq!(update.player, a);
        let received = client_mut(&mut clients, b).drain();
        assert_eq!(received[0], update.to_message());
        if session.games_started() == 1 {
            assert_eq!(session.active_player(), Some(b));
            check_invariants(&session);
        }

        // A second start request is never accepted
        assert!(!session.apply_move(a, &Message::MoveToken { id: a, x, y, side }));
    }

    #[test]
    fn test_forced_move_walks_through_sub_states() {
        let mut session = session(config(2), 25);
        let mut clients = vec![connect(&mut session, 1000), connect(&mut session, 1001)];
        drain_all(&mut clients);
        let a = session.active_player().unwrap();

        // First placement
        expire(&mut session);
        assert!(session.board().player_start_tile(a).is_some());
        assert_ne!(session.active_player(), Some(a));

        // Opponent's first placement
        expire(&mut session);
        assert_eq!(session.active_player(), Some(a));

        // Start side
        expire(&mut session);
        assert!(session.board().have_player_position(a) || session.games_started() > 1);

        // The board fills up, so forced moves alone always end the game
        let mut steps = 0;
        while session.games_started() == 1 {
            assert!(steps < GAME_STEP_BOUND, "game never ended");
            check_invariants(&session);
            expire(&mut session);
            steps += 1;
        }
        for client in clients.iter_mut() {
            assert!(client
                .drain()
                .iter()
                .any(|m| matches!(m, Message::PlaceTile { .. })));
        }
    }

    #[test]
    fn test_forced_move_for_inactive_player_is_ignored() {
        let mut session = session(config(2), 26);
        let mut clients = vec![connect(&mut session, 1000), connect(&mut session, 1001)];
        drain_all(&mut clients);
        let idle = session.turn_order().as_slice()[1];

        session.force_move(idle);
        assert!(session.placements().is_empty());
        assert!(clients.iter_mut().all(|c| c.drain().is_empty()));
    }

    #[test]
    fn test_stalled_player_without_moves_is_eliminated() {
        let (board, _script) = ScriptedBoard::new();
        let game = tp_core::config::GameConfig {
            countdown: std::time::Duration::from_secs(1),
            ..config(4)
        };
        let mut session = session_with_board(game, 27, Box::new(board));
        let mut clients: Vec<_> = (0..3).map(|i| connect(&mut session, 1000 + i)).collect();
        expire(&mut session);
        drain_all(&mut clients);

        let order = session.turn_order().as_slice().to_vec();
        let (a, b, c) = (order[0], order[1], order[2]);
        for player in [a, b, c] {
            let placement = first_placement(&session, player);
            assert!(session.apply_move(player, &placement));
        }

        // `a` puts its token on its own, already occupied, start tile
        let (x, y) = session.board().player_start_tile(a).unwrap();
        assert!(session.apply_move(a, &Message::MoveToken { id: a, x, y, side: 0 }));
        for player in [b, c] {
            let placement = first_placement(&session, player);
            assert!(session.apply_move(player, &placement));
        }
        assert_eq!(session.active_player(), Some(a));
        drain_all(&mut clients);

        // The only forced move for `a` targets an occupied cell
        expire(&mut session);

        assert_eq!(session.eliminated(), &[a]);
        assert_eq!(session.active_player(), Some(b));
        check_invariants(&session);
        assert_eq!(
            client_mut(&mut clients, c).drain(),
            vec![
                Message::PlayerEliminated { id: a },
                Message::PlayerTurn { id: b },
            ]
        );
    }

    #[test]
    fn test_elimination_ending_game_starts_next_one() {
        let (board, script) = ScriptedBoard::new();
        let mut session = session_with_board(config(4), 28, Box::new(board));
        let mut clients: Vec<_> = (0..2).map(|i| connect(&mut session, 1000 + i)).collect();
        let mut spectator = connect(&mut session, 1002);
        assert_eq!(session.turn_order().len(), 2);
        drain_all(&mut clients);
        spectator.drain();

        let a = session.active_player().unwrap();
        let b = session.turn_order().as_slice()[1];
        for player in [a, b] {
            let placement = first_placement(&session, player);
            session.handle_message(player, placement);
        }
        drain_all(&mut clients);

        // a's token runs straight off the board
        let exit = TokenPosition::new(0, 0, 7);
        script.lock().unwrap().push_back(MovementOutcome {
            moves: vec![TokenMove {
                player: a,
                position: exit,
            }],
            eliminated: vec![a],
        });
        let (x, y) = session.board().player_start_tile(a).unwrap();
        session.handle_message(a, Message::MoveToken { id: a, x, y, side: 0 });

        // One participant left: game over, and a new game is formed from the
        // three pooled connections
        assert_eq!(session.games_started(), 2);
        assert_eq!(session.turn_order().len(), 3);
        assert!(session.eliminated().is_empty());
        check_invariants(&session);

        let to_b = client_mut(&mut clients, b).drain();
        assert_eq!(to_b[0], TokenMove { player: a, position: exit }.to_message());
        assert_eq!(to_b[1], Message::PlayerEliminated { id: a });
        assert_eq!(to_b[2], Message::Welcome { id: b });
        assert_eq!(to_b[3], Message::GameStart);
        assert!(spectator.drain().contains(&Message::GameStart));
    }

    #[test]
    fn test_seeded_games_hold_invariants_and_finish() {
        for seed in 0..40u64 {
            let mut session = session(config(4), seed);
            let mut churn = StdRng::seed_from_u64(seed.wrapping_mul(7919));
            let mut port = 1000u16;
            let mut clients = Vec::new();
            for _ in 0..2 + seed % 5 {
                clients.push(connect(&mut session, port));
                port += 1;
            }

            let mut games = session.games_started();
            let mut game_began = 0;
            for step in 0..400 {
                check_invariants(&session);
                check_hands(&session);
                if session.games_started() != games {
                    games = session.games_started();
                    game_began = step;
                }
                assert!(
                    step - game_began < GAME_STEP_BOUND,
                    "seed {}: game {} did not finish",
                    seed,
                    games
                );

                match churn.gen_range(0..25) {
                    0 if clients.len() > 2 => {
                        let leaving: Client = clients.swap_remove(churn.gen_range(0..clients.len()));
                        session.disconnect(leaving.id);
                    }
                    1 if clients.len() < 6 => {
                        clients.push(connect(&mut session, port));
                        port += 1;
                    }
                    _ => expire(&mut session),
                }
                drain_all(&mut clients);
            }
            assert!(session.games_started() >= 4, "seed {}: too few games", seed);
        }
    }

    #[test]
    fn test_four_player_game_runs_to_last_survivor() {
        let (board, script) = ScriptedBoard::new();
        let mut session = session_with_board(config(4), 29, Box::new(board));
        let mut clients: Vec<_> = (0..4).map(|i| connect(&mut session, 1000 + i)).collect();
        drain_all(&mut clients);
        let order = session.turn_order().as_slice().to_vec();
        assert_eq!(order.len(), 4);

        // The first mover knocks out the last seat
        script.lock().unwrap().push_back(MovementOutcome {
            moves: vec![],
            eliminated: vec![order[3]],
        });
        let placement = first_placement(&session, order[0]);
        session.handle_message(order[0], placement);
        assert_eq!(session.turn_order().as_slice(), &[order[1], order[2], order[0]]);
        assert_eq!(session.eliminated(), &[order[3]]);
        check_invariants(&session);
        check_hands(&session);
        drain_all(&mut clients);

        // The next mover survives a double elimination in board order
        script.lock().unwrap().push_back(MovementOutcome {
            moves: vec![],
            eliminated: vec![order[2], order[0]],
        });
        let placement = first_placement(&session, order[1]);
        session.handle_message(order[1], placement.clone());

        assert_eq!(session.games_started(), 2);
        assert_eq!(session.turn_order().len(), 4);
        assert!(session.eliminated().is_empty());
        check_invariants(&session);
        check_hands(&session);

        let next_order = session.turn_order().as_slice().to_vec();
        let next_active = session.active_player().unwrap();
        for client in clients.iter_mut() {
            let received = client.drain();
            let mut expected = vec![
                placement.clone(),
                Message::PlayerEliminated { id: order[2] },
                Message::PlayerEliminated { id: order[0] },
                Message::Welcome { id: client.id },
                Message::GameStart,
            ];
            expected.extend(next_order.iter().map(|&id| Message::PlayerTurn { id }));
            expected.push(Message::PlayerTurn { id: next_active });
            assert_eq!(&received[..expected.len()], expected.as_slice());

            // No exchange for the winning move, only the fresh deal
            let dealt = &received[expected.len()..];
            assert_eq!(dealt.len(), session.config().hand_size);
            assert!(dealt
                .iter()
                .all(|m| matches!(m, Message::AddTileToHand { .. })));
        }
    }
}
