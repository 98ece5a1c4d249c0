//! `GambitServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gambit_protocol::{Codec, JsonCodec};
use gambit_session::{RulesOracle, SessionConfig, SessionHandle, spawn_session};
use gambit_transport::{Transport, TransportError, WebSocketHandshake, WebSocketTransport};

use crate::GambitError;
use crate::handler::handle_connection;

/// How long a connection may stay silent before it is dropped. Any frame
/// counts, including the pongs answering the server's heartbeat.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// How often the server pings each connection.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

/// How long a new socket gets to complete its WebSocket upgrade.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Nothing here
/// needs a lock: all mutable game state lives behind the session handle.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) session: SessionHandle,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
    pub(crate) heartbeat_interval: Duration,
    pub(crate) handshake_timeout: Duration,
}

/// Builder for configuring and starting a Gambit server.
///
/// # Example
///
/// ```rust,ignore
/// use gambit::prelude::*;
///
/// let server = GambitServer::builder()
///     .bind("0.0.0.0:3000")
///     .idle_timeout(std::time::Duration::from_secs(30))
///     .build(ChessRules::new())
///     .await?;
/// server.run().await
/// ```
pub struct GambitServerBuilder {
    bind_addr: String,
    idle_timeout: Duration,
    heartbeat_interval: Duration,
    handshake_timeout: Duration,
    session_config: SessionConfig,
}

impl GambitServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets how long a connection may go without sending a frame.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets how often each connection is pinged. Keep this well under the
    /// idle timeout so responsive clients are never dropped.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets how long a new socket may take to complete its upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the session actor configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener and starts the session actor for `oracle`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<O: RulesOracle>(
        self,
        oracle: O,
    ) -> Result<GambitServer<JsonCodec>, GambitError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let session = spawn_session(oracle, self.session_config);

        let state = Arc::new(ServerState {
            session,
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
            heartbeat_interval: self.heartbeat_interval,
            handshake_timeout: self.handshake_timeout,
        });

        Ok(GambitServer { transport, state })
    }
}

impl Default for GambitServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Gambit server with a running session.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GambitServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl GambitServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> GambitServerBuilder {
        GambitServerBuilder::new()
    }
}

impl<C: Codec> GambitServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, GambitError> {
        Ok(self.transport.local_addr()?)
    }

    /// A handle to the session, for inspection or out-of-band commands.
    pub fn session(&self) -> SessionHandle {
        self.state.session.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), GambitError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then stops the
    /// session actor. Connection tasks wind down as their queues close.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), GambitError> {
        tracing::info!("gambit server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.transport.accept() => self.spawn_handler(accepted),
            }
        }

        tracing::info!("gambit server shutting down");
        self.state.session.shutdown().await?;
        Ok(())
    }

    /// Hands an accepted socket to its own task. The WebSocket upgrade runs
    /// there too, so a stalled peer never holds up the accept loop.
    fn spawn_handler(&self, accepted: Result<WebSocketHandshake, TransportError>) {
        match accepted {
            Ok(pending) => {
                let state = Arc::clone(&self.state);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(pending, state).await {
                        tracing::debug!(error = %e, "connection ended with error");
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
            }
        }
    }
}
