//! Per-connection handler
//!
//! Each connection gets a reader loop (this task) and a writer task. The
//! writer drains the connection's outbound queue so broadcasts issued under
//! the session lock never wait on this peer's socket.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use tp_protocol::{FrameCodec, PlayerId};

use crate::coordinator::GameCoordinator;

/// Serve one client until it disconnects, fails, or `cancel` fires.
///
/// Whatever ends the connection, the player is removed from the session
/// exactly once on the way out.
pub async fn handle_connection(
    coordinator: Arc<GameCoordinator>,
    socket: TcpStream,
    peer_addr: SocketAddr,
    cancel: CancellationToken,
) {
    let (reader, writer) = socket.into_split();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let Some(player) = coordinator.connect(peer_addr, outbound_tx).await else {
        tracing::warn!("Closing {}: server is out of player ids", peer_addr);
        return;
    };

    let writer_task = tokio::spawn(write_frames(writer, outbound_rx, player, cancel.clone()));

    let mut frames = FramedRead::new(reader, FrameCodec::new());
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Connection handler for {} cancelled", player);
                break;
            }

            next = frames.next() => match next {
                Some(Ok(message)) => {
                    coordinator.handle_message(player, message).await;
                }
                Some(Err(e)) => {
                    tracing::warn!("Closing {} ({}): {}", player, peer_addr, e);
                    break;
                }
                None => {
                    tracing::debug!("{} ({}) closed the connection", player, peer_addr);
                    break;
                }
            }
        }
    }

    coordinator.disconnect(player).await;
    cancel.cancel();
    if let Err(e) = writer_task.await {
        tracing::warn!("Writer task for {} failed: {}", player, e);
    }
}

/// Write queued frames until the queue closes, a write fails, or `cancel`
/// fires. A failed write cancels the reader too.
async fn write_frames(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Bytes>,
    player: PlayerId,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    break;
                };
                tracing::trace!("Writing {} bytes to {}", frame.len(), player);
                if let Err(e) = writer.write_all(&frame).await {
                    tracing::warn!("Write to {} failed: {}", player, e);
                    cancel.cancel();
                    break;
                }
            }
        }
    }

    let _ = writer.shutdown().await;
}
