//! Seat assignment, turn coordination, and session lifecycle for Gambit.
//!
//! One session hosts one two-player game plus any number of observers. It
//! runs as a single Tokio task (actor model) that owns every piece of
//! mutable state; connection handlers talk to it through a
//! [`SessionHandle`].
//!
//! # Key types
//!
//! - [`RulesOracle`]: the trait a game's rules engine implements
//! - [`RoleTable`]: which connection holds which seat
//! - [`SessionState`]: seats, game state, and [`Phase`] in one record
//! - [`submit_move`]: the turn coordinator, producing a [`MoveOutcome`]
//! - [`Dispatcher`]: sequenced broadcast and unicast to clients
//! - [`SessionHandle`]: send commands to the running actor

mod actor;
mod config;
mod coordinator;
mod dispatch;
mod error;
mod oracle;
mod roles;
mod state;

pub mod lifecycle;

#[cfg(test)]
mod testing;

pub use actor::{SessionHandle, SessionInfo, spawn_session};
pub use config::{Phase, SessionConfig};
pub use coordinator::{MoveOutcome, submit_move};
pub use dispatch::{Dispatcher, OutboundSender};
pub use error::SessionError;
pub use oracle::{OracleError, RulesOracle, Transition};
pub use roles::RoleTable;
pub use state::{SessionState, Snapshot};
