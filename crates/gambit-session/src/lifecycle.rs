//! Session lifecycle: ending a game and resetting it.

use gambit_protocol::Outcome;

use crate::oracle::guarded;
use crate::{OracleError, RulesOracle, SessionState, Snapshot};

/// Moves the session into `Ended`.
///
/// Returns `false` if it had already ended; the first outcome sticks.
pub fn conclude<S>(session: &mut SessionState<S>, outcome: Outcome) -> bool {
    match session.phase.end(outcome) {
        Some(next) => {
            session.phase = next;
            tracing::info!(%outcome, "game ended");
            true
        }
        None => false,
    }
}

/// Ends the session if its current game state is already terminal.
///
/// Used when a game starts rather than after a move: a custom start
/// position can be over before anyone plays. A failed check leaves the
/// phase alone.
pub fn settle<O: RulesOracle>(
    oracle: &O,
    session: &mut SessionState<O::State>,
) -> Option<Outcome> {
    match guarded(|| Ok(oracle.terminal_status(&session.game))) {
        Ok(Some(outcome)) => {
            conclude(session, outcome);
            Some(outcome)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::error!(error = %e, "terminal check on start position failed");
            None
        }
    }
}

/// Puts the game back at the start position and reopens it for moves.
///
/// Seats are left exactly as they are. Allowed from any phase, by anyone;
/// callers do not check who asked. If the start position is itself
/// terminal the session ends again straight away.
///
/// # Errors
/// Returns the oracle's error if it fails to produce a start position; the
/// session is left untouched in that case.
pub fn reset<O: RulesOracle>(
    oracle: &O,
    session: &mut SessionState<O::State>,
) -> Result<Snapshot, OracleError> {
    let (initial, snapshot) = guarded(|| {
        let initial = oracle.initial_state();
        let snapshot = Snapshot {
            state: oracle.serialize(&initial),
            turn: oracle.current_turn(&initial),
        };
        Ok((initial, snapshot))
    })?;

    session.game = initial;
    session.phase = crate::Phase::InProgress;
    tracing::info!("game reset to start position");
    settle(oracle, session);
    Ok(snapshot)
}

/// Serializes the current game for clients.
///
/// # Errors
/// Returns the oracle's error if serialization fails.
pub fn snapshot<O: RulesOracle>(
    oracle: &O,
    session: &SessionState<O::State>,
) -> Result<Snapshot, OracleError> {
    guarded(|| {
        Ok(Snapshot {
            state: oracle.serialize(&session.game),
            turn: oracle.current_turn(&session.game),
        })
    })
}
