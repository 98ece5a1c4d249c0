//! # Gambit
//!
//! A server for one two-player chess game at a time, with any number of
//! spectators, over WebSockets.
//!
//! The first two connections take White and Black; everyone after that
//! watches. All game state lives in a single session actor, so every
//! client sees every event in the same order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gambit::prelude::*;
//!
//! # async fn run() -> Result<(), GambitError> {
//! let server = GambitServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build(ChessRules::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::GambitError;
pub use server::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_IDLE_TIMEOUT, GambitServer,
    GambitServerBuilder,
};

/// Everything needed to run a server or write a client test.
pub mod prelude {
    pub use crate::{GambitError, GambitServer, GambitServerBuilder};
    pub use gambit_chess::ChessRules;
    pub use gambit_protocol::{
        ClientMessage, Codec, Envelope, JsonCodec, MoveRequest, Outcome, RejectReason,
        RoleSnapshot, ServerMessage, Side,
    };
    pub use gambit_session::{RulesOracle, SessionConfig, SessionHandle};
    pub use gambit_transport::ConnectionId;
}
