//! Error types for the session layer.

use gambit_transport::ConnectionId;

use crate::OracleError;

/// Errors that can occur when talking to the session actor.
///
/// Game-level refusals (wrong turn, illegal move) are *not* errors: they
/// come back as a [`MoveOutcome`](crate::MoveOutcome) and a rejection
/// echo to the mover.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The actor's command channel is closed; the session has shut down.
    #[error("session is unavailable")]
    Unavailable,

    /// The connection is already registered with the session.
    #[error("{0} is already connected")]
    AlreadyConnected(ConnectionId),

    /// The rules oracle failed outside of move handling (start position,
    /// serialization).
    #[error(transparent)]
    Rules(#[from] OracleError),
}
