//! Standard chess rules for Gambit.
//!
//! [`ChessRules`] implements [`RulesOracle`](gambit_session::RulesOracle)
//! on top of the `chess` crate's move generator, adding the bookkeeping
//! a bare board doesn't carry: move counters, repetition history, and
//! draw detection.

mod error;
mod position;
mod rules;

pub use error::RulesError;
pub use position::Position;
pub use rules::ChessRules;
