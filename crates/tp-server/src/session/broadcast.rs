//! Fan-out of outbound messages to pooled connections
//!
//! Messages are encoded once and the same bytes are queued on every target
//! connection's outbound channel; the writing happens on each connection's own
//! writer task. A closed channel is skipped here and reconciled by that
//! connection's disconnect path.

use bytes::Bytes;

use tp_protocol::{Message, PlayerId};

use super::registry::{ConnectionRegistry, PlayerSession};

impl ConnectionRegistry {
    /// Send to every pooled connection
    pub fn send_all(&self, message: &Message) {
        self.fan_out(message, |_| true);
    }

    /// Send to every pooled connection except `except`
    pub fn send_others(&self, message: &Message, except: PlayerId) {
        self.fan_out(message, |session| session.id != except);
    }

    /// Send to a single connection
    pub fn send_to(&self, id: PlayerId, message: &Message) {
        let Some(session) = self.get(id) else {
            return;
        };
        if let Some(frame) = encode(message) {
            deliver(session, frame);
        }
    }

    fn fan_out(&self, message: &Message, include: impl Fn(&PlayerSession) -> bool) {
        let Some(frame) = encode(message) else {
            return;
        };
        for session in self.iter() {
            if include(session) {
                deliver(session, frame.clone());
            }
        }
    }
}

fn encode(message: &Message) -> Option<Bytes> {
    match tp_protocol::encode(message) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::error!("Failed to encode {:?}: {}", message, e);
            None
        }
    }
}

fn deliver(session: &PlayerSession, frame: Bytes) {
    if session.outbound().send(frame).is_err() {
        tracing::debug!("Outbound queue for {} is closed, skipping", session.id);
    }
}
