//! Outbound fan-out with session-wide sequence numbers.

use std::collections::HashMap;

use gambit_protocol::{Envelope, RejectReason, ServerMessage};
use gambit_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::MoveOutcome;

/// Channel sender for delivering envelopes to a connection's writer task.
pub type OutboundSender = mpsc::UnboundedSender<Envelope>;

/// Every connected client's outbound queue, plus the sequence counter.
///
/// Each emitted event takes the next sequence number. A broadcast is one
/// event, so every recipient sees the same `seq` for it. Since all sends
/// happen from the session actor and each queue is FIFO, a connection never
/// sees event N+1 before N. It may see gaps where an event went to
/// someone else.
#[derive(Debug, Default)]
pub struct Dispatcher {
    subscribers: HashMap<ConnectionId, OutboundSender>,
    next_seq: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection's outbound queue. Returns `false` if the
    /// connection was already registered; the existing queue is kept.
    pub fn subscribe(&mut self, conn: ConnectionId, sender: OutboundSender) -> bool {
        if self.subscribers.contains_key(&conn) {
            return false;
        }
        self.subscribers.insert(conn, sender);
        true
    }

    /// Drops a connection's outbound queue. Returns `true` if it was present.
    pub fn unsubscribe(&mut self, conn: ConnectionId) -> bool {
        self.subscribers.remove(&conn).is_some()
    }

    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.subscribers.contains_key(&conn)
    }

    /// Number of connected clients.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Sends one message to one connection. Silently drops it if the
    /// connection is gone.
    pub fn send_to(&mut self, conn: ConnectionId, payload: ServerMessage) {
        let envelope = self.stamp(payload);
        if let Some(sender) = self.subscribers.get(&conn) {
            let _ = sender.send(envelope);
        }
    }

    /// Sends one message to every connection.
    pub fn broadcast(&mut self, payload: ServerMessage) {
        let envelope = self.stamp(payload);
        for sender in self.subscribers.values() {
            let _ = sender.send(envelope.clone());
        }
    }

    /// Emits the events for a move submission.
    ///
    /// Applied moves go to everyone as `move_applied`, then `state_snapshot`,
    /// then `session_ended` if the move finished the game. Rejections go
    /// back to the submitter alone.
    pub fn deliver(&mut self, submitter: ConnectionId, outcome: &MoveOutcome) {
        match outcome {
            MoveOutcome::Applied {
                request,
                captured,
                snapshot,
                ended,
            } => {
                self.broadcast(ServerMessage::MoveApplied {
                    request: request.clone(),
                    captured: *captured,
                });
                self.broadcast(snapshot.to_message());
                if let Some(outcome) = ended {
                    self.broadcast(ServerMessage::SessionEnded { outcome: *outcome });
                }
            }
            MoveOutcome::RejectedNotYourTurn { request } => {
                self.send_to(
                    submitter,
                    ServerMessage::MoveRejected {
                        request: request.clone(),
                        reason: RejectReason::NotYourTurn,
                    },
                );
            }
            MoveOutcome::RejectedIllegal { request } => {
                self.send_to(
                    submitter,
                    ServerMessage::MoveRejected {
                        request: request.clone(),
                        reason: RejectReason::Illegal,
                    },
                );
            }
        }
    }

    fn stamp(&mut self, payload: ServerMessage) -> Envelope {
        self.next_seq += 1;
        Envelope {
            seq: self.next_seq,
            payload,
        }
    }
}
