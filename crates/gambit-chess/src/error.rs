//! Error types for the chess rules crate.

/// Errors that can occur while setting up the rules engine.
///
/// Move-time refusals are not reported here; they surface as
/// [`OracleError`](gambit_session::OracleError) through the session.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    /// The start position could not be parsed or is not a legal position.
    #[error("invalid FEN {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },
}
