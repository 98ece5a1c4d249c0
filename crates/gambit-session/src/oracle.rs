//! The `RulesOracle` trait: the seam between turn coordination and the
//! rules of a particular game.
//!
//! The session never inspects game state itself. It asks the oracle whose
//! turn it is, whether a move is legal, and whether the game is over, and
//! treats the state as an opaque value it stores and hands back.

use gambit_protocol::{CapturedPiece, MoveSpec, Outcome, Side};

/// The result of applying a legal move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<S> {
    /// The game state after the move.
    pub state: S,
    /// The piece removed from the board by the move, if any.
    pub captured: Option<CapturedPiece>,
}

/// Why the oracle refused a move.
///
/// The session maps every variant to the same soft rejection; the split
/// exists so logs can tell a bad client from a bad rules engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The move breaks the rules of the game.
    #[error("illegal move: {0}")]
    Illegal(String),

    /// The oracle could not evaluate the move at all.
    #[error("rules engine failure: {0}")]
    Internal(String),
}

/// Pure move validation and state transformation for one game.
///
/// Implementations must be deterministic: the same state and move always
/// produce the same answer. Nothing here may block or perform I/O; the
/// session actor calls these methods while no other operation can run.
///
/// The oracle is also the sole authority on whose turn it is. The session
/// stores no turn counter of its own, so turn ownership can never drift
/// from the game state.
pub trait RulesOracle: Send + Sync + 'static {
    /// The full game state.
    type State: Send + Sync + Clone + std::fmt::Debug + 'static;

    /// The start-of-game state. Called once at session start and again on
    /// every reset.
    fn initial_state(&self) -> Self::State;

    /// The side that moves next in `state`.
    fn current_turn(&self, state: &Self::State) -> Side;

    /// Applies `mv` to `state`, returning the new state without modifying
    /// the old one.
    ///
    /// # Errors
    /// [`OracleError::Illegal`] for rule violations,
    /// [`OracleError::Internal`] if the oracle itself is in trouble.
    fn apply(
        &self,
        state: &Self::State,
        mv: &MoveSpec,
    ) -> Result<Transition<Self::State>, OracleError>;

    /// Returns how the game ended, or `None` while it is still running.
    fn terminal_status(&self, state: &Self::State) -> Option<Outcome>;

    /// Serializes `state` for clients (for chess, a FEN string).
    fn serialize(&self, state: &Self::State) -> String;
}

/// Runs an oracle call, converting a panic inside it into
/// [`OracleError::Internal`].
///
/// A panic inside the oracle costs the offending payload a rejection and
/// never unwinds into the session actor. `AssertUnwindSafe` holds because
/// callers only pass shared references into the oracle and commit results
/// after it returns.
pub(crate) fn guarded<T>(
    f: impl FnOnce() -> Result<T, OracleError>,
) -> Result<T, OracleError> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            tracing::error!(%message, "rules engine panicked");
            Err(OracleError::Internal(format!("panicked: {message}")))
        }
    }
}
