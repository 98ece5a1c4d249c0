//! Wire protocol for Gambit.
//!
//! This crate defines the "language" that players, observers, and the
//! server speak:
//!
//! - **Messages** ([`ClientMessage`], [`ServerMessage`], [`Envelope`]):
//!   the structures that travel on the wire as JSON text frames.
//! - **Notation** ([`Square`], [`PieceKind`], [`MoveSpec`]): the typed
//!   form a move takes once it has been validated at the boundary.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages are turned
//!   into text and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding or
//!   validating.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (text frames) and the session
//! actor (roles, turns, game state). It knows nothing about connections
//! beyond their identifiers and nothing about chess rules beyond square
//! names.
//!
//! ```text
//! Transport (text) → Protocol (ClientMessage) → Session (turn coordination)
//! ```

mod codec;
mod error;
mod notation;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use notation::{MoveSpec, PieceKind, Square};
pub use types::{
    CapturedPiece, ClientMessage, DrawRule, Envelope, MoveRequest, Outcome, RejectReason,
    Role, RoleSnapshot, ServerMessage, Side,
};
