//! Global server state

use std::sync::Arc;

use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tp_core::config::ServerConfig;
use tp_core::Board;

use crate::clock::run_clock;
use crate::coordinator::GameCoordinator;
use crate::session::GameSession;

/// Global state for the game server
pub struct ServerState {
    /// Configuration
    pub config: ServerConfig,
    /// The one game session, behind its lock
    pub coordinator: Arc<GameCoordinator>,
}

impl ServerState {
    /// Build the session and start its clock task.
    ///
    /// Must be called from within a tokio runtime. The clock task stops when
    /// `cancel` fires.
    pub fn start(config: ServerConfig, rng: StdRng, cancel: CancellationToken) -> Arc<Self> {
        let (clock_tx, clock_rx) = mpsc::unbounded_channel();
        let session = GameSession::new(
            config.game.clone(),
            Box::new(Board::new()),
            Box::new(clock_tx),
            rng,
        );
        let coordinator = Arc::new(GameCoordinator::new(session));

        tokio::spawn(run_clock(Arc::clone(&coordinator), clock_rx, cancel));

        Arc::new(Self {
            config,
            coordinator,
        })
    }
}
