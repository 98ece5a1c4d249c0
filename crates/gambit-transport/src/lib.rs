//! Transport abstraction layer for Gambit.
//!
//! Provides the [`Transport`] and [`Connection`] traits that the server
//! programs against, plus a WebSocket implementation. Frames are text:
//! every message Gambit exchanges is JSON, and browsers read text frames
//! without any extra decoding step.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketHandshake, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a connection.
///
/// Connection identity is the only identity Gambit knows about: a client
/// that drops and comes back is a brand new `ConnectionId`. Serializes as
/// a plain number so role snapshots can name seat holders on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
///
/// `accept` only takes the socket off the listener. The protocol
/// handshake runs later through [`Handshake::complete`], so a peer that
/// never finishes its handshake cannot hold up the next accept.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// An accepted socket whose handshake has not run yet.
    type Handshake: Handshake<Connection = Self::Connection, Error = Self::Error>;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming socket.
    async fn accept(&mut self) -> Result<Self::Handshake, Self::Error>;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// The second half of accepting a connection: the protocol upgrade.
///
/// Has no timeout of its own; callers bound it.
pub trait Handshake: Send + 'static {
    /// The connection produced once the handshake succeeds.
    type Connection: Connection;
    /// The error type for a failed handshake.
    type Error: std::error::Error + Send + Sync;

    /// The identifier the finished connection will carry.
    fn id(&self) -> ConnectionId;

    /// Runs the handshake to completion.
    async fn complete(self) -> Result<Self::Connection, Self::Error>;
}

/// What a single [`Connection::recv`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// An application frame.
    Text(String),
    /// A control frame (ping or pong). Carries no data, but shows the peer
    /// is still there.
    Heartbeat,
}

/// A single connection that exchanges text frames with a peer.
///
/// Sending and receiving may run concurrently from different tasks: a
/// pending `recv` must never hold up a `send`.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a text frame to the remote peer.
    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Sends a keep-alive ping the peer is expected to answer.
    async fn ping(&self) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Inbound>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
