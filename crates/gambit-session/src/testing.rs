//! A scripted rules oracle for unit tests.
//!
//! Behaviour keyed on the destination square:
//! - `h8`: illegal
//! - `a8`: internal oracle failure
//! - `d5`: legal, captures an enemy pawn
//! - `from == to`: the oracle panics
//! - anything else: legal
//!
//! The game ends in checkmate for the last mover once `finish_after`
//! plies have been played.

use gambit_protocol::{CapturedPiece, MoveSpec, Outcome, PieceKind, Side};

use crate::{OracleError, RulesOracle, Transition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScriptState {
    pub(crate) plies: u32,
}

pub(crate) struct ScriptedOracle {
    finish_after: u32,
}

impl ScriptedOracle {
    pub(crate) fn finishing_after(plies: u32) -> Self {
        Self {
            finish_after: plies,
        }
    }
}

impl RulesOracle for ScriptedOracle {
    type State = ScriptState;

    fn initial_state(&self) -> ScriptState {
        ScriptState { plies: 0 }
    }

    fn current_turn(&self, state: &ScriptState) -> Side {
        if state.plies % 2 == 0 {
            Side::White
        } else {
            Side::Black
        }
    }

    fn apply(
        &self,
        state: &ScriptState,
        mv: &MoveSpec,
    ) -> Result<Transition<ScriptState>, OracleError> {
        if mv.from == mv.to {
            panic!("scripted oracle cannot handle null moves");
        }
        match mv.to.to_string().as_str() {
            "h8" => Err(OracleError::Illegal("h8 is off limits".into())),
            "a8" => Err(OracleError::Internal("a8 confuses the engine".into())),
            to => {
                let mover = self.current_turn(state);
                let captured = (to == "d5").then_some(CapturedPiece {
                    side: mover.opponent(),
                    kind: PieceKind::Pawn,
                });
                Ok(Transition {
                    state: ScriptState {
                        plies: state.plies + 1,
                    },
                    captured,
                })
            }
        }
    }

    fn terminal_status(&self, state: &ScriptState) -> Option<Outcome> {
        (state.plies >= self.finish_after).then(|| Outcome::Checkmate {
            winner: self.current_turn(state).opponent(),
        })
    }

    fn serialize(&self, state: &ScriptState) -> String {
        format!("plies={}", state.plies)
    }
}

/// Builds a structurally valid move from two square names.
pub(crate) fn spec(from: &str, to: &str) -> MoveSpec {
    MoveSpec {
        from: from.parse().expect("valid square"),
        to: to.parse().expect("valid square"),
        promotion: None,
    }
}
