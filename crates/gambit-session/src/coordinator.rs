//! Turn coordination: deciding what happens to a submitted move.
//!
//! A submission passes four gates in order:
//!   1. Seat: the sender must hold the seat whose turn it is
//!   2. Phase: the game must not be over
//!   3. Shape: the payload must name real squares and a real promotion
//!   4. Rules: the oracle must accept the move
//!
//! Only a move that clears all four touches the session state. The
//! terminal check runs in the same step as the commit.

use gambit_protocol::{CapturedPiece, MoveRequest, Outcome, Side};
use gambit_transport::ConnectionId;

use crate::oracle::guarded;
use crate::{RulesOracle, SessionState, Snapshot, Transition, lifecycle};

/// What became of a submitted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was applied. Everyone hears about it.
    Applied {
        request: MoveRequest,
        captured: Option<CapturedPiece>,
        snapshot: Snapshot,
        /// Set when this move ended the game.
        ended: Option<Outcome>,
    },
    /// The sender holds no seat, it isn't their turn, or the game is over.
    RejectedNotYourTurn { request: MoveRequest },
    /// The payload is malformed, breaks the rules, or confused the oracle.
    RejectedIllegal { request: MoveRequest },
}

impl MoveOutcome {
    /// Returns `true` for [`MoveOutcome::Applied`].
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// The payload as the client sent it.
    pub fn request(&self) -> &MoveRequest {
        match self {
            Self::Applied { request, .. }
            | Self::RejectedNotYourTurn { request }
            | Self::RejectedIllegal { request } => request,
        }
    }
}

/// Everything computed from a legal move before any of it is committed.
struct Evaluated<S> {
    state: S,
    captured: Option<CapturedPiece>,
    snapshot: Snapshot,
    ended: Option<Outcome>,
}

/// Runs a move submission through every gate and commits it if legal.
///
/// The caller must hold exclusive access to `session` for the whole call;
/// the session actor guarantees that by processing one command at a time.
pub fn submit_move<O: RulesOracle>(
    oracle: &O,
    session: &mut SessionState<O::State>,
    conn: ConnectionId,
    request: MoveRequest,
) -> MoveOutcome {
    // --- Gate 1: seat ---
    let Some(side) = session.roles.side_of(conn) else {
        tracing::debug!(%conn, "move from connection without a seat");
        return MoveOutcome::RejectedNotYourTurn { request };
    };

    let turn = match guarded(|| Ok(oracle.current_turn(&session.game))) {
        Ok(turn) => turn,
        Err(e) => {
            tracing::warn!(%conn, error = %e, "could not determine turn");
            return MoveOutcome::RejectedIllegal { request };
        }
    };
    if side != turn {
        tracing::debug!(%conn, %side, %turn, "move out of turn");
        return MoveOutcome::RejectedNotYourTurn { request };
    }

    // --- Gate 2: phase ---
    if !session.phase.accepts_moves() {
        tracing::debug!(%conn, phase = %session.phase, "move after game ended");
        return MoveOutcome::RejectedNotYourTurn { request };
    }

    // --- Gate 3: shape ---
    let spec = match request.parse() {
        Ok(spec) => spec,
        Err(e) => {
            tracing::debug!(%conn, error = %e, "malformed move payload");
            return MoveOutcome::RejectedIllegal { request };
        }
    };

    // --- Gate 4: rules ---
    let evaluated = guarded(|| {
        let Transition { state, captured } = oracle.apply(&session.game, &spec)?;
        let snapshot = Snapshot {
            state: oracle.serialize(&state),
            turn: oracle.current_turn(&state),
        };
        let ended = oracle.terminal_status(&state);
        Ok(Evaluated {
            state,
            captured,
            snapshot,
            ended,
        })
    });

    let Evaluated {
        state,
        captured,
        snapshot,
        ended,
    } = match evaluated {
        Ok(evaluated) => evaluated,
        Err(e) => {
            tracing::debug!(%conn, mv = %spec, error = %e, "move rejected by rules");
            return MoveOutcome::RejectedIllegal { request };
        }
    };

    // --- Commit ---
    session.game = state;
    tracing::info!(%conn, %side, mv = %spec, next = %snapshot.turn, "move applied");
    if let Some(outcome) = ended {
        lifecycle::conclude(session, outcome);
    }

    MoveOutcome::Applied {
        request,
        captured,
        snapshot,
        ended,
    }
}
