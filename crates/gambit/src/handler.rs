//! Per-connection handler: registration, reading frames, writing events.
//!
//! Each accepted socket gets its own Tokio task running this handler,
//! plus a writer task. The flow is:
//!   0. Complete the WebSocket upgrade, within the handshake timeout
//!   1. Register with the session → role notice and snapshot are queued
//!   2. Writer task drains the outbound queue onto the socket and pings
//!      the peer on every heartbeat tick
//!   3. Read loop: decode client frames → forward to the session
//!   4. On close, error, or idle timeout → disconnect from the session

use std::sync::Arc;
use std::time::Duration;

use gambit_protocol::{ClientMessage, Codec, Envelope, ServerMessage};
use gambit_session::{SessionError, SessionHandle};
use gambit_transport::{
    Connection, ConnectionId, Handshake, Inbound, WebSocketConnection, WebSocketHandshake,
};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::GambitError;
use crate::server::ServerState;

/// Drop guard that disconnects a connection from the session if the
/// handler exits without doing so itself (a panic, or task abort).
///
/// `Drop` is synchronous, so the disconnect is spawned as a
/// fire-and-forget task.
struct DisconnectGuard {
    conn_id: ConnectionId,
    session: SessionHandle,
    armed: bool,
}

impl DisconnectGuard {
    fn new(conn_id: ConnectionId, session: SessionHandle) -> Self {
        Self {
            conn_id,
            session,
            armed: true,
        }
    }

    /// Disconnects now and waits for the session to confirm.
    async fn disconnect(mut self) {
        self.armed = false;
        match self.session.disconnect(self.conn_id).await {
            Ok(Some(side)) => tracing::info!(conn_id = %self.conn_id, %side, "seat vacated"),
            Ok(None) => {}
            Err(e) => tracing::debug!(conn_id = %self.conn_id, error = %e, "disconnect failed"),
        }
    }
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let conn_id = self.conn_id;
        let session = self.session.clone();
        tokio::spawn(async move {
            let _ = session.disconnect(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    pending: WebSocketHandshake,
    state: Arc<ServerState<C>>,
) -> Result<(), GambitError> {
    let conn_id = pending.id();
    let peer = pending.peer_addr();

    // --- Step 0: Upgrade ---
    let conn = match tokio::time::timeout(state.handshake_timeout, pending.complete()).await {
        Ok(upgraded) => Arc::new(upgraded?),
        Err(_) => {
            tracing::info!(
                %conn_id,
                %peer,
                timeout = ?state.handshake_timeout,
                "handshake timed out, dropping"
            );
            return Ok(());
        }
    };
    tracing::debug!(%conn_id, %peer, "handling new connection");

    // --- Step 1: Register ---
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let role = match state.session.connect(conn_id, outbound_tx).await {
        Ok(role) => role,
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "session refused connection");
            let _ = conn.close().await;
            return Err(e.into());
        }
    };
    let guard = DisconnectGuard::new(conn_id, state.session.clone());
    tracing::info!(%conn_id, ?role, "client connected");

    // --- Step 2: Writer ---
    let writer = tokio::spawn(write_loop(
        Arc::clone(&conn),
        outbound_rx,
        Arc::clone(&state),
    ));

    // --- Step 3: Read loop ---
    let result = read_loop(&conn, &state).await;

    // --- Step 4: Teardown ---
    // Once the session forgets us it drops our queue, and the writer
    // finishes after flushing whatever was already queued.
    guard.disconnect().await;
    let _ = writer.await;
    let _ = conn.close().await;
    tracing::info!(%conn_id, "client disconnected");

    result
}

/// Reads frames until the peer goes away, errors, or falls silent.
///
/// Every frame restarts the idle clock, control frames included.
async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
) -> Result<(), GambitError> {
    let conn_id = conn.id();

    loop {
        let text = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(Inbound::Text(text)))) => text,
            Ok(Ok(Some(Inbound::Heartbeat))) => {
                tracing::trace!(%conn_id, "heartbeat");
                continue;
            }
            Ok(Ok(None)) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                return Ok(());
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                return Ok(());
            }
            Err(_) => {
                tracing::info!(%conn_id, timeout = ?state.idle_timeout, "connection idle, dropping");
                return Ok(());
            }
        };

        let message: ClientMessage = match state.codec.decode(&text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode client frame");
                state
                    .session
                    .send_to(
                        conn_id,
                        ServerMessage::Error {
                            code: 400,
                            message: e.to_string(),
                        },
                    )
                    .await?;
                continue;
            }
        };

        match message {
            ClientMessage::Move(request) => {
                let outcome = state.session.submit_move(conn_id, request).await?;
                tracing::debug!(%conn_id, applied = outcome.is_applied(), "move handled");
            }
            ClientMessage::Reset => match state.session.reset(conn_id).await {
                Ok(()) => {}
                Err(SessionError::Rules(e)) => {
                    state
                        .session
                        .send_to(
                            conn_id,
                            ServerMessage::Error {
                                code: 500,
                                message: e.to_string(),
                            },
                        )
                        .await?;
                }
                Err(e) => return Err(e.into()),
            },
            ClientMessage::Ping { client_time } => {
                state
                    .session
                    .send_to(conn_id, ServerMessage::Pong { client_time })
                    .await?;
            }
        }
    }
}

/// Encodes queued envelopes and writes them to the socket, in order, and
/// pings the peer whenever the heartbeat interval passes.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut outbound: mpsc::UnboundedReceiver<Envelope>,
    state: Arc<ServerState<C>>,
) {
    let conn_id = conn.id();
    // `interval` rejects a zero period.
    let period = state.heartbeat_interval.max(Duration::from_millis(1));
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            queued = outbound.recv() => {
                let Some(envelope) = queued else { break };
                let text = match state.codec.encode(&envelope) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(%conn_id, seq = envelope.seq, error = %e, "failed to encode event");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&text).await {
                    tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if let Err(e) = conn.ping().await {
                    tracing::debug!(%conn_id, error = %e, "ping failed, stopping writer");
                    break;
                }
            }
        }
    }
}
