//! Game server listener
//!
//! Accepts incoming connections and spawns a handler for each client.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::server::handler::handle_connection;
use crate::state::ServerState;

/// Game server that listens for incoming connections
pub struct GameServer {
    /// Shared server state
    state: Arc<ServerState>,
    /// Cancellation token for graceful shutdown
    cancel: CancellationToken,
}

impl GameServer {
    /// Create a new game server
    pub fn new(state: Arc<ServerState>, cancel: CancellationToken) -> Self {
        Self { state, cancel }
    }

    /// Bind to `bind_addr` and serve until cancelled
    pub async fn run(&self, bind_addr: &str) -> Result<()> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {}", bind_addr))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener until cancelled
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!("Game server listening on {}", local_addr);

        loop {
            tokio::select! {
                // Check for shutdown
                _ = self.cancel.cancelled() => {
                    tracing::info!("Game server shutting down");
                    break;
                }

                // Accept new connections
                result = listener.accept() => {
                    match result {
                        Ok((socket, peer_addr)) => {
                            self.spawn_handler(socket, peer_addr);
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn spawn_handler(&self, socket: TcpStream, peer_addr: SocketAddr) {
        tracing::debug!("New connection from {}", peer_addr);

        if let Err(e) = socket.set_nodelay(true) {
            tracing::warn!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
        }

        let coordinator = Arc::clone(&self.state.coordinator);
        let cancel = self.cancel.child_token();
        tokio::spawn(handle_connection(coordinator, socket, peer_addr, cancel));
    }
}
