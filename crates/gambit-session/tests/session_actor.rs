//! Integration tests for the session actor using a mock rules oracle.

use std::time::Duration;

use gambit_protocol::{
    CapturedPiece, Envelope, MoveRequest, MoveSpec, Outcome, PieceKind, RejectReason, Role,
    RoleSnapshot, ServerMessage, Side,
};
use gambit_session::{
    MoveOutcome, OracleError, Phase, RulesOracle, SessionConfig, SessionError, SessionHandle,
    Transition, spawn_session,
};
use gambit_transport::ConnectionId;
use tokio::sync::mpsc;

// =========================================================================
// Mock oracle: counts plies, ends in checkmate after a fixed number.
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tally {
    plies: u32,
}

/// Legal unless the move goes to `h8`; the c-file captures a knight; a null move
/// panics. The last mover wins once `mate_after` plies are on the board.
struct TallyRules {
    mate_after: u32,
}

impl RulesOracle for TallyRules {
    type State = Tally;

    fn initial_state(&self) -> Tally {
        Tally { plies: 0 }
    }

    fn current_turn(&self, state: &Tally) -> Side {
        if state.plies % 2 == 0 {
            Side::White
        } else {
            Side::Black
        }
    }

    fn apply(&self, state: &Tally, mv: &MoveSpec) -> Result<Transition<Tally>, OracleError> {
        assert_ne!(mv.from, mv.to, "null move reached the oracle");
        if mv.to.to_string() == "h8" {
            return Err(OracleError::Illegal("h8 is never legal here".into()));
        }
        let captured = (mv.to.file() == 2).then(|| CapturedPiece {
            side: self.current_turn(state).opponent(),
            kind: PieceKind::Knight,
        });
        Ok(Transition {
            state: Tally {
                plies: state.plies + 1,
            },
            captured,
        })
    }

    fn terminal_status(&self, state: &Tally) -> Option<Outcome> {
        (state.plies >= self.mate_after).then(|| Outcome::Checkmate {
            winner: self.current_turn(state).opponent(),
        })
    }

    fn serialize(&self, state: &Tally) -> String {
        format!("tally:{}", state.plies)
    }
}

// =========================================================================
// Helpers
// =========================================================================

/// One simulated connection: its id and the receiving end of its queue.
struct Client {
    conn: ConnectionId,
    rx: mpsc::UnboundedReceiver<Envelope>,
    last_seq: u64,
}

impl Client {
    async fn connect(session: &SessionHandle, id: u64) -> (Self, Role) {
        let conn = ConnectionId::new(id);
        let (tx, rx) = mpsc::unbounded_channel();
        let role = session.connect(conn, tx).await.unwrap();
        (
            Self {
                conn,
                rx,
                last_seq: 0,
            },
            role,
        )
    }

    /// Next payload, asserting that sequence numbers only go up.
    async fn next(&mut self) -> ServerMessage {
        let envelope = tokio::time::timeout(Duration::from_secs(1), self.rx.recv())
            .await
            .expect("timed out waiting for a message")
            .expect("outbound queue closed");
        assert!(
            envelope.seq > self.last_seq,
            "seq went from {} to {}",
            self.last_seq,
            envelope.seq
        );
        self.last_seq = envelope.seq;
        envelope.payload
    }

    /// Discards everything queued so far.
    async fn drain(&mut self, session: &SessionHandle) {
        sync(session).await;
        while self.rx.try_recv().is_ok() {}
    }

    /// Asserts nothing is queued.
    async fn assert_quiet(&mut self, session: &SessionHandle) {
        sync(session).await;
        if let Ok(envelope) = self.rx.try_recv() {
            panic!("{} got unexpected {envelope:?}", self.conn);
        }
    }
}

/// Waits until the actor has processed every command sent before this one.
async fn sync(session: &SessionHandle) {
    session.inspect().await.unwrap();
}

fn mv(from: &str, to: &str) -> MoveRequest {
    MoveRequest::new(from, to)
}

fn start(mate_after: u32) -> SessionHandle {
    spawn_session(TallyRules { mate_after }, SessionConfig::default())
}

fn roles(white: Option<u64>, black: Option<u64>) -> RoleSnapshot {
    RoleSnapshot {
        white: white.map(ConnectionId::new),
        black: black.map(ConnectionId::new),
    }
}

// =========================================================================
// Role assignment
// =========================================================================

#[tokio::test]
async fn test_first_two_connections_get_seats_rest_observe() {
    let session = start(100);

    let (_c1, r1) = Client::connect(&session, 1).await;
    let (_c2, r2) = Client::connect(&session, 2).await;
    let (_c3, r3) = Client::connect(&session, 3).await;
    let (_c4, r4) = Client::connect(&session, 4).await;

    assert_eq!(r1, Role::Player(Side::White));
    assert_eq!(r2, Role::Player(Side::Black));
    assert_eq!(r3, Role::Observer);
    assert_eq!(r4, Role::Observer);

    let info = session.inspect().await.unwrap();
    assert_eq!(info.roles, roles(Some(1), Some(2)));
    assert_eq!(info.connections, 4);
}

#[tokio::test]
async fn test_player_connect_message_order() {
    let session = start(100);
    let (mut c1, _) = Client::connect(&session, 1).await;

    assert_eq!(c1.next().await, ServerMessage::RoleAssigned { side: Side::White });
    assert_eq!(
        c1.next().await,
        ServerMessage::RolesChanged {
            roles: roles(Some(1), None)
        }
    );
    assert_eq!(
        c1.next().await,
        ServerMessage::StateSnapshot {
            state: "tally:0".into(),
            turn: Side::White
        }
    );
    c1.assert_quiet(&session).await;
}

#[tokio::test]
async fn test_observer_connect_does_not_broadcast_roles() {
    let session = start(100);
    let (mut c1, _) = Client::connect(&session, 1).await;
    let (mut c2, _) = Client::connect(&session, 2).await;
    c1.drain(&session).await;
    c2.drain(&session).await;

    let (mut c3, _) = Client::connect(&session, 3).await;
    assert_eq!(c3.next().await, ServerMessage::ObserverAssigned);
    assert!(matches!(c3.next().await, ServerMessage::StateSnapshot { .. }));

    c1.assert_quiet(&session).await;
    c2.assert_quiet(&session).await;
}

#[tokio::test]
async fn test_duplicate_connect_is_refused() {
    let session = start(100);
    let (_c1, _) = Client::connect(&session, 1).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let result = session.connect(ConnectionId::new(1), tx).await;
    assert!(matches!(result, Err(SessionError::AlreadyConnected(_))));
}

#[tokio::test]
async fn test_vacated_seat_goes_to_next_newcomer_not_observer() {
    let session = start(100);
    let (c1, _) = Client::connect(&session, 1).await;
    let (mut c2, _) = Client::connect(&session, 2).await;
    let (mut c3, r3) = Client::connect(&session, 3).await;
    assert_eq!(r3, Role::Observer);
    c2.drain(&session).await;
    c3.drain(&session).await;

    let vacated = session.disconnect(c1.conn).await.unwrap();
    assert_eq!(vacated, Some(Side::White));

    for client in [&mut c2, &mut c3] {
        assert_eq!(client.next().await, ServerMessage::PlayerLeft { side: Side::White });
        assert_eq!(
            client.next().await,
            ServerMessage::RolesChanged {
                roles: roles(None, Some(2))
            }
        );
    }

    // The existing observer stays an observer.
    let info = session.inspect().await.unwrap();
    assert_eq!(info.roles, roles(None, Some(2)));

    let (mut c4, r4) = Client::connect(&session, 4).await;
    assert_eq!(r4, Role::Player(Side::White));
    assert_eq!(c4.next().await, ServerMessage::RoleAssigned { side: Side::White });
}

#[tokio::test]
async fn test_observer_disconnect_is_silent() {
    let session = start(100);
    let (mut c1, _) = Client::connect(&session, 1).await;
    let (_c2, _) = Client::connect(&session, 2).await;
    let (c3, _) = Client::connect(&session, 3).await;
    c1.drain(&session).await;

    assert_eq!(session.disconnect(c3.conn).await.unwrap(), None);
    c1.assert_quiet(&session).await;
    assert_eq!(session.inspect().await.unwrap().connections, 2);
}

#[tokio::test]
async fn test_disconnect_unknown_connection_is_noop() {
    let session = start(100);
    assert_eq!(session.disconnect(ConnectionId::new(77)).await.unwrap(), None);
}

// =========================================================================
// Scenario A: connect two players, White opens
// =========================================================================

#[tokio::test]
async fn test_opening_move_is_broadcast_and_turn_flips() {
    let session = start(100);
    let (mut c1, _) = Client::connect(&session, 1).await;
    let (mut c2, _) = Client::connect(&session, 2).await;
    let (mut c3, _) = Client::connect(&session, 3).await;
    for c in [&mut c1, &mut c2, &mut c3] {
        c.drain(&session).await;
    }

    let outcome = session.submit_move(c1.conn, mv("e2", "e4")).await.unwrap();
    assert!(outcome.is_applied());

    for c in [&mut c1, &mut c2, &mut c3] {
        assert_eq!(
            c.next().await,
            ServerMessage::MoveApplied {
                request: mv("e2", "e4"),
                captured: None
            }
        );
        assert_eq!(
            c.next().await,
            ServerMessage::StateSnapshot {
                state: "tally:1".into(),
                turn: Side::Black
            }
        );
    }

    assert_eq!(session.inspect().await.unwrap().turn, Side::Black);
}

#[tokio::test]
async fn test_capture_is_reported_to_everyone() {
    let session = start(100);
    let (mut c1, _) = Client::connect(&session, 1).await;
    let (mut c2, _) = Client::connect(&session, 2).await;
    c1.drain(&session).await;
    c2.drain(&session).await;

    session.submit_move(c1.conn, mv("e2", "e4")).await.unwrap();
    c2.drain(&session).await;
    session.submit_move(c2.conn, mv("d5", "c4")).await.unwrap();

    let expected = Some(CapturedPiece {
        side: Side::White,
        kind: PieceKind::Knight,
    });
    assert_eq!(
        c2.next().await,
        ServerMessage::MoveApplied {
            request: mv("d5", "c4"),
            captured: expected
        }
    );
}

// =========================================================================
// Scenario B: out-of-turn moves
// =========================================================================

#[tokio::test]
async fn test_out_of_turn_move_is_rejected_privately() {
    let session = start(100);
    let (mut c1, _) = Client::connect(&session, 1).await;
    let (mut c2, _) = Client::connect(&session, 2).await;
    c1.drain(&session).await;
    c2.drain(&session).await;

    let outcome = session.submit_move(c2.conn, mv("e7", "e5")).await.unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::RejectedNotYourTurn {
            request: mv("e7", "e5")
        }
    );

    assert_eq!(
        c2.next().await,
        ServerMessage::MoveRejected {
            request: mv("e7", "e5"),
            reason: RejectReason::NotYourTurn
        }
    );
    c1.assert_quiet(&session).await;

    let info = session.inspect().await.unwrap();
    assert_eq!(info.state, "tally:0");
    assert_eq!(info.turn, Side::White);
}

#[tokio::test]
async fn test_observer_move_is_rejected() {
    let session = start(100);
    let (mut c1, _) = Client::connect(&session, 1).await;
    let (_c2, _) = Client::connect(&session, 2).await;
    let (mut c3, _) = Client::connect(&session, 3).await;
    c1.drain(&session).await;
    c3.drain(&session).await;

    session.submit_move(c3.conn, mv("e2", "e4")).await.unwrap();
    assert_eq!(
        c3.next().await,
        ServerMessage::MoveRejected {
            request: mv("e2", "e4"),
            reason: RejectReason::NotYourTurn
        }
    );
    c1.assert_quiet(&session).await;
}

#[tokio::test]
async fn test_move_from_departed_connection_is_rejected() {
    let session = start(100);
    let (c1, _) = Client::connect(&session, 1).await;
    let (_c2, _) = Client::connect(&session, 2).await;
    session.disconnect(c1.conn).await.unwrap();

    let outcome = session.submit_move(c1.conn, mv("e2", "e4")).await.unwrap();
    assert!(matches!(outcome, MoveOutcome::RejectedNotYourTurn { .. }));
    assert_eq!(session.inspect().await.unwrap().state, "tally:0");
}

#[tokio::test]
async fn test_illegal_and_malformed_moves_are_rejected_as_illegal() {
    let session = start(100);
    let (mut c1, _) = Client::connect(&session, 1).await;
    let (mut c2, _) = Client::connect(&session, 2).await;
    c1.drain(&session).await;
    c2.drain(&session).await;

    for request in [mv("g7", "h8"), mv("e2", "z9"), mv("e2", "")] {
        session.submit_move(c1.conn, request.clone()).await.unwrap();
        assert_eq!(
            c1.next().await,
            ServerMessage::MoveRejected {
                request,
                reason: RejectReason::Illegal
            }
        );
    }
    c2.assert_quiet(&session).await;
    assert_eq!(session.inspect().await.unwrap().state, "tally:0");
}

#[tokio::test]
async fn test_oracle_panic_is_contained() {
    let session = start(100);
    let (mut c1, _) = Client::connect(&session, 1).await;
    let (_c2, _) = Client::connect(&session, 2).await;
    c1.drain(&session).await;

    let outcome = session.submit_move(c1.conn, mv("e4", "e4")).await.unwrap();
    assert!(matches!(outcome, MoveOutcome::RejectedIllegal { .. }));

    // The actor survived and still takes moves.
    let outcome = session.submit_move(c1.conn, mv("e2", "e4")).await.unwrap();
    assert!(outcome.is_applied());
}

#[tokio::test]
async fn test_concurrent_submissions_for_one_turn_apply_once() {
    let session = start(100);
    let (c1, _) = Client::connect(&session, 1).await;
    let (_c2, _) = Client::connect(&session, 2).await;

    let (a, b) = tokio::join!(
        session.submit_move(c1.conn, mv("e2", "e4")),
        session.submit_move(c1.conn, mv("d2", "d4")),
    );
    let applied = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|o| o.is_applied())
        .count();
    assert_eq!(applied, 1);
    assert_eq!(session.inspect().await.unwrap().state, "tally:1");
}

#[tokio::test]
async fn test_turns_alternate_from_white() {
    let session = start(100);
    let (c1, _) = Client::connect(&session, 1).await;
    let (c2, _) = Client::connect(&session, 2).await;

    for ply in 0..6 {
        let (mover, idle) = if ply % 2 == 0 { (&c1, &c2) } else { (&c2, &c1) };

        let refused = session.submit_move(idle.conn, mv("a2", "a3")).await.unwrap();
        assert!(!refused.is_applied());

        let accepted = session.submit_move(mover.conn, mv("a2", "a3")).await.unwrap();
        assert!(accepted.is_applied(), "ply {ply}");
    }
}

// =========================================================================
// Scenario D: game end and reset
// =========================================================================

#[tokio::test]
async fn test_mate_ends_game_and_reset_reopens_it() {
    let session = start(3);
    let (mut c1, _) = Client::connect(&session, 1).await;
    let (mut c2, _) = Client::connect(&session, 2).await;
    let (mut c3, _) = Client::connect(&session, 3).await;

    session.submit_move(c1.conn, mv("f2", "f3")).await.unwrap();
    session.submit_move(c2.conn, mv("e7", "e5")).await.unwrap();
    for c in [&mut c1, &mut c2, &mut c3] {
        c.drain(&session).await;
    }

    let outcome = session.submit_move(c1.conn, mv("g2", "g4")).await.unwrap();
    assert!(matches!(
        outcome,
        MoveOutcome::Applied {
            ended: Some(Outcome::Checkmate { winner: Side::White }),
            ..
        }
    ));

    for c in [&mut c1, &mut c2, &mut c3] {
        assert!(matches!(c.next().await, ServerMessage::MoveApplied { .. }));
        assert!(matches!(c.next().await, ServerMessage::StateSnapshot { .. }));
        assert_eq!(
            c.next().await,
            ServerMessage::SessionEnded {
                outcome: Outcome::Checkmate {
                    winner: Side::White
                }
            }
        );
    }

    // Black is on move per the rules, but nothing moves once the game ended.
    let refused = session.submit_move(c2.conn, mv("d8", "h4")).await.unwrap();
    assert!(matches!(refused, MoveOutcome::RejectedNotYourTurn { .. }));
    assert_eq!(session.inspect().await.unwrap().state, "tally:3");
    c2.drain(&session).await;

    // An observer may reset.
    session.reset(c3.conn).await.unwrap();
    for c in [&mut c1, &mut c2, &mut c3] {
        assert_eq!(
            c.next().await,
            ServerMessage::StateSnapshot {
                state: "tally:0".into(),
                turn: Side::White
            }
        );
    }

    let info = session.inspect().await.unwrap();
    assert_eq!(info.phase, Phase::InProgress);
    assert_eq!(info.roles, roles(Some(1), Some(2)));

    let outcome = session.submit_move(c1.conn, mv("e2", "e4")).await.unwrap();
    assert!(outcome.is_applied());
}

#[tokio::test]
async fn test_late_joiner_learns_game_is_over() {
    let session = start(1);
    let (c1, _) = Client::connect(&session, 1).await;
    let (_c2, _) = Client::connect(&session, 2).await;
    session.submit_move(c1.conn, mv("e2", "e4")).await.unwrap();

    let (mut c3, _) = Client::connect(&session, 3).await;
    assert_eq!(c3.next().await, ServerMessage::ObserverAssigned);
    assert_eq!(
        c3.next().await,
        ServerMessage::StateSnapshot {
            state: "tally:1".into(),
            turn: Side::Black
        }
    );
    assert_eq!(
        c3.next().await,
        ServerMessage::SessionEnded {
            outcome: Outcome::Checkmate {
                winner: Side::White
            }
        }
    );
}

#[tokio::test]
async fn test_finished_start_position_is_ended_from_the_outset() {
    let session = start(0);
    let mate = ServerMessage::SessionEnded {
        outcome: Outcome::Checkmate {
            winner: Side::Black,
        },
    };

    let (mut c1, _) = Client::connect(&session, 1).await;
    assert_eq!(c1.next().await, ServerMessage::RoleAssigned { side: Side::White });
    assert!(matches!(c1.next().await, ServerMessage::RolesChanged { .. }));
    assert!(matches!(c1.next().await, ServerMessage::StateSnapshot { .. }));
    assert_eq!(c1.next().await, mate);

    let outcome = session.submit_move(c1.conn, mv("e2", "e4")).await.unwrap();
    assert!(matches!(outcome, MoveOutcome::RejectedNotYourTurn { .. }));
    c1.drain(&session).await;

    // Resetting lands on the same finished position, so it ends again.
    session.reset(c1.conn).await.unwrap();
    assert!(matches!(c1.next().await, ServerMessage::StateSnapshot { .. }));
    assert_eq!(c1.next().await, mate);
    assert!(matches!(
        session.inspect().await.unwrap().phase,
        Phase::Ended(_)
    ));
}

#[tokio::test]
async fn test_reset_mid_game_keeps_seats() {
    let session = start(100);
    let (c1, _) = Client::connect(&session, 1).await;
    let (_c2, _) = Client::connect(&session, 2).await;
    session.submit_move(c1.conn, mv("e2", "e4")).await.unwrap();

    session.reset(c1.conn).await.unwrap();

    let info = session.inspect().await.unwrap();
    assert_eq!(info.state, "tally:0");
    assert_eq!(info.turn, Side::White);
    assert_eq!(info.roles, roles(Some(1), Some(2)));
}

// =========================================================================
// Notify and shutdown
// =========================================================================

#[tokio::test]
async fn test_send_to_reaches_only_target() {
    let session = start(100);
    let (mut c1, _) = Client::connect(&session, 1).await;
    let (mut c2, _) = Client::connect(&session, 2).await;
    c1.drain(&session).await;
    c2.drain(&session).await;

    session
        .send_to(c2.conn, ServerMessage::Pong { client_time: 42 })
        .await
        .unwrap();

    assert_eq!(c2.next().await, ServerMessage::Pong { client_time: 42 });
    c1.assert_quiet(&session).await;
}

#[tokio::test]
async fn test_shutdown_makes_handle_unavailable() {
    let session = start(100);
    let (mut c1, _) = Client::connect(&session, 1).await;

    session.shutdown().await.unwrap();

    // The actor drops every outbound queue on the way out.
    while c1.rx.recv().await.is_some() {}

    let result = session.inspect().await;
    assert!(matches!(result, Err(SessionError::Unavailable)));
}
