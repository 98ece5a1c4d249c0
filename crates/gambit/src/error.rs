//! Unified error type for Gambit.

use gambit_chess::RulesError;
use gambit_protocol::ProtocolError;
use gambit_session::SessionError;
use gambit_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GambitError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, malformed move).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session actor is gone or refused a connection.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The rules engine could not be set up.
    #[error(transparent)]
    Rules(#[from] RulesError),
}
