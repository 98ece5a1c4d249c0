//! Error types for the protocol layer.
//!
//! Each Gambit crate owns its error enum. A `ProtocolError` always means
//! the problem is in the shape of a message, never in networking or in the
//! rules of the game.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into JSON text).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown `type` tag,
    /// missing fields, or wrong field types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A move payload decoded fine but is not a structurally valid move,
    /// such as a square named `"z9"` or a promotion to a king.
    ///
    /// The session treats this exactly like a rule violation: the mover
    /// gets a rejection echo, nobody else hears about it.
    #[error("malformed move: {0}")]
    MalformedMove(String),
}
