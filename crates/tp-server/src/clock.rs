//! Turn deadline and countdown timer
//!
//! The session never sleeps. Instead it hands [`ClockTicket`]s to a
//! [`TurnClock`]; the clock task started by [`run_clock`] waits for the
//! ticket's delay and hands it back through [`GameCoordinator::on_clock`].
//! Every arm or disarm bumps the session's epoch, so a ticket that fires after
//! the session has moved on no longer matches and is discarded.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use tp_protocol::PlayerId;

use crate::coordinator::GameCoordinator;

/// What an armed ticket is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// The given player's turn deadline
    Turn(PlayerId),
    /// The pre-game countdown
    Countdown,
}

/// One armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTicket {
    /// Session epoch at the time the ticket was armed
    pub epoch: u64,
    pub kind: ClockKind,
    /// Delay from arming until the ticket fires
    pub after: Duration,
}

/// Commands accepted by the clock task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockCommand {
    /// Replace any pending ticket with this one
    Arm(ClockTicket),
    /// Drop the pending ticket
    Disarm,
}

/// Where the session sends its timer requests
pub trait TurnClock: Send {
    fn arm(&self, ticket: ClockTicket);
    fn disarm(&self);
}

impl TurnClock for mpsc::UnboundedSender<ClockCommand> {
    fn arm(&self, ticket: ClockTicket) {
        if self.send(ClockCommand::Arm(ticket)).is_err() {
            tracing::debug!("Clock task is gone, ticket {:?} dropped", ticket);
        }
    }

    fn disarm(&self) {
        if self.send(ClockCommand::Disarm).is_err() {
            tracing::debug!("Clock task is gone, disarm dropped");
        }
    }
}

/// Run the clock task.
///
/// Holds at most one pending ticket. When it expires the ticket is delivered
/// to the coordinator, which decides whether it is still current.
///
/// # Arguments
///
/// * `coordinator` - Receives expired tickets
/// * `commands` - Arm/disarm requests from the session
/// * `cancel` - Cancellation token for graceful shutdown
pub async fn run_clock(
    coordinator: Arc<GameCoordinator>,
    mut commands: mpsc::UnboundedReceiver<ClockCommand>,
    cancel: CancellationToken,
) {
    let mut pending: Option<(Instant, ClockTicket)> = None;

    tracing::debug!("Starting session clock task");

    loop {
        let deadline = pending.map(|(at, _)| at);

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Session clock task shutting down");
                break;
            }

            command = commands.recv() => match command {
                Some(ClockCommand::Arm(ticket)) => {
                    pending = Some((Instant::now() + ticket.after, ticket));
                }
                Some(ClockCommand::Disarm) => pending = None,
                None => break,
            },

            _ = sleep_until(deadline) => {
                if let Some((_, ticket)) = pending.take() {
                    tracing::trace!("Clock ticket {:?} expired", ticket);
                    coordinator.on_clock(ticket).await;
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_forwards_commands() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticket = ClockTicket {
            epoch: 3,
            kind: ClockKind::Countdown,
            after: Duration::from_secs(1),
        };

        TurnClock::arm(&tx, ticket);
        TurnClock::disarm(&tx);

        assert_eq!(rx.try_recv().unwrap(), ClockCommand::Arm(ticket));
        assert_eq!(rx.try_recv().unwrap(), ClockCommand::Disarm);
    }

    #[test]
    fn test_closed_clock_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel::<ClockCommand>();
        drop(rx);
        TurnClock::disarm(&tx);
        TurnClock::arm(
            &tx,
            ClockTicket {
                epoch: 1,
                kind: ClockKind::Turn(PlayerId::new(0)),
                after: Duration::ZERO,
            },
        );
    }
}
