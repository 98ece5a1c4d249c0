//! Session actor: the one Tokio task that owns the session.
//!
//! Connection handlers never touch seats or game state. They send commands
//! through a [`SessionHandle`] and the actor applies them one at a time, in
//! arrival order. All outbound events are emitted from inside the actor, so
//! every client sees them in the order they happened.

use gambit_protocol::{MoveRequest, Role, RoleSnapshot, ServerMessage, Side};
use gambit_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{
    Dispatcher, MoveOutcome, OutboundSender, Phase, RulesOracle, SessionConfig, SessionError,
    SessionState, coordinator, lifecycle,
};

/// Commands sent to the session actor through its channel.
///
/// Variants with a `reply` are request/response: the caller awaits the
/// answer on the oneshot.
enum SessionCommand {
    /// Register a connection and hand it a role.
    Connect {
        conn: ConnectionId,
        outbound: OutboundSender,
        reply: oneshot::Sender<Result<Role, SessionError>>,
    },

    /// Forget a connection, freeing its seat if it held one.
    Disconnect {
        conn: ConnectionId,
        reply: oneshot::Sender<Option<Side>>,
    },

    /// Submit a move on behalf of a connection.
    Move {
        conn: ConnectionId,
        request: MoveRequest,
        reply: oneshot::Sender<MoveOutcome>,
    },

    /// Put the game back at the start position.
    Reset {
        conn: ConnectionId,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Queue a message for one connection behind everything already sent.
    Notify {
        conn: ConnectionId,
        message: ServerMessage,
    },

    /// Read-only view of the session.
    Inspect {
        reply: oneshot::Sender<Result<SessionInfo, SessionError>>,
    },

    /// Stop the actor. Outbound queues close with it.
    Shutdown,
}

/// A point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub phase: Phase,
    pub roles: RoleSnapshot,
    /// Whose turn it is according to the rules oracle.
    pub turn: Side,
    /// The serialized game state.
    pub state: String,
    /// Number of live connections, players and observers alike.
    pub connections: usize,
}

/// Handle to the running session actor.
///
/// Cheap to clone: it's an `mpsc::Sender` wrapper. Every connection handler
/// holds one.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Registers `conn` and assigns it a role. Everything the session sends
    /// to this connection from now on goes to `outbound`.
    ///
    /// The newcomer's queue receives, in order: its role notice, the
    /// `roles_changed` broadcast if it took a seat, a `state_snapshot`, and
    /// `session_ended` if the game is over.
    pub async fn connect(
        &self,
        conn: ConnectionId,
        outbound: OutboundSender,
    ) -> Result<Role, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            SessionCommand::Connect {
                conn,
                outbound,
                reply,
            },
            rx,
        )
        .await?
    }

    /// Removes `conn`. Returns the seat it vacated, if any.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<Option<Side>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::Disconnect { conn, reply }, rx)
            .await
    }

    /// Submits a move. The outcome is also delivered to clients by the
    /// actor; the return value is for the caller's own bookkeeping.
    pub async fn submit_move(
        &self,
        conn: ConnectionId,
        request: MoveRequest,
    ) -> Result<MoveOutcome, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            SessionCommand::Move {
                conn,
                request,
                reply,
            },
            rx,
        )
        .await
    }

    /// Resets the game. Any connection may ask, in any phase.
    pub async fn reset(&self, conn: ConnectionId) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::Reset { conn, reply }, rx)
            .await?
    }

    /// Queues `message` for `conn` (fire-and-forget).
    pub async fn send_to(
        &self,
        conn: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Notify { conn, message })
            .await
            .map_err(|_| SessionError::Unavailable)
    }

    /// Returns a snapshot of phase, seats, and game state.
    pub async fn inspect(&self) -> Result<SessionInfo, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::Inspect { reply }, rx).await?
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::Unavailable)
    }

    async fn request<T>(
        &self,
        command: SessionCommand,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, SessionError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| SessionError::Unavailable)?;
        rx.await.map_err(|_| SessionError::Unavailable)
    }
}

/// The actor's private state. Runs inside a Tokio task.
struct SessionActor<O: RulesOracle> {
    oracle: O,
    session: SessionState<O::State>,
    dispatcher: Dispatcher,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl<O: RulesOracle> SessionActor<O> {
    async fn run(mut self) {
        tracing::info!("session actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SessionCommand::Connect {
                    conn,
                    outbound,
                    reply,
                } => {
                    let _ = reply.send(self.handle_connect(conn, outbound));
                }
                SessionCommand::Disconnect { conn, reply } => {
                    let _ = reply.send(self.handle_disconnect(conn));
                }
                SessionCommand::Move {
                    conn,
                    request,
                    reply,
                } => {
                    let outcome =
                        coordinator::submit_move(&self.oracle, &mut self.session, conn, request);
                    self.dispatcher.deliver(conn, &outcome);
                    let _ = reply.send(outcome);
                }
                SessionCommand::Reset { conn, reply } => {
                    let _ = reply.send(self.handle_reset(conn));
                }
                SessionCommand::Notify { conn, message } => {
                    self.dispatcher.send_to(conn, message);
                }
                SessionCommand::Inspect { reply } => {
                    let _ = reply.send(self.info());
                }
                SessionCommand::Shutdown => {
                    tracing::info!("session shutting down");
                    break;
                }
            }
        }

        tracing::info!("session actor stopped");
    }

    fn handle_connect(
        &mut self,
        conn: ConnectionId,
        outbound: OutboundSender,
    ) -> Result<Role, SessionError> {
        if !self.dispatcher.subscribe(conn, outbound) {
            return Err(SessionError::AlreadyConnected(conn));
        }

        let role = self.session.roles.assign(conn);
        tracing::info!(
            %conn,
            ?role,
            connections = self.dispatcher.len(),
            "connection joined"
        );

        match role {
            Role::Player(side) => {
                self.dispatcher
                    .send_to(conn, ServerMessage::RoleAssigned { side });
                self.dispatcher.broadcast(ServerMessage::RolesChanged {
                    roles: self.session.roles.snapshot(),
                });
            }
            Role::Observer => {
                self.dispatcher
                    .send_to(conn, ServerMessage::ObserverAssigned);
            }
        }

        match lifecycle::snapshot(&self.oracle, &self.session) {
            Ok(snapshot) => self.dispatcher.send_to(conn, snapshot.to_message()),
            Err(e) => tracing::error!(%conn, error = %e, "could not snapshot for newcomer"),
        }
        if let Some(outcome) = self.session.phase.outcome() {
            self.dispatcher
                .send_to(conn, ServerMessage::SessionEnded { outcome });
        }

        Ok(role)
    }

    fn handle_disconnect(&mut self, conn: ConnectionId) -> Option<Side> {
        if !self.dispatcher.unsubscribe(conn) {
            return None;
        }

        let vacated = self.session.roles.vacate(conn);
        tracing::info!(
            %conn,
            vacated = ?vacated,
            connections = self.dispatcher.len(),
            "connection left"
        );

        if let Some(side) = vacated {
            self.dispatcher.broadcast(ServerMessage::PlayerLeft { side });
            self.dispatcher.broadcast(ServerMessage::RolesChanged {
                roles: self.session.roles.snapshot(),
            });
        }
        vacated
    }

    fn handle_reset(&mut self, conn: ConnectionId) -> Result<(), SessionError> {
        tracing::info!(%conn, "reset requested");
        let snapshot = lifecycle::reset(&self.oracle, &mut self.session)
            .inspect_err(|e| tracing::error!(%conn, error = %e, "reset failed"))?;
        self.dispatcher.broadcast(snapshot.to_message());
        if let Some(outcome) = self.session.phase.outcome() {
            self.dispatcher
                .broadcast(ServerMessage::SessionEnded { outcome });
        }
        Ok(())
    }

    fn info(&self) -> Result<SessionInfo, SessionError> {
        let snapshot = lifecycle::snapshot(&self.oracle, &self.session)?;
        Ok(SessionInfo {
            phase: self.session.phase,
            roles: self.session.roles.snapshot(),
            turn: snapshot.turn,
            state: snapshot.state,
            connections: self.dispatcher.len(),
        })
    }
}

/// Spawns the session actor with a fresh game and returns a handle to it.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_session<O: RulesOracle>(oracle: O, config: SessionConfig) -> SessionHandle {
    let (tx, rx) = mpsc::channel(config.command_buffer);

    let mut session = SessionState::new(oracle.initial_state());
    if let Some(outcome) = lifecycle::settle(&oracle, &mut session) {
        tracing::warn!(%outcome, "start position is already over");
    }
    let actor = SessionActor {
        oracle,
        session,
        dispatcher: Dispatcher::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    SessionHandle { sender: tx }
}
