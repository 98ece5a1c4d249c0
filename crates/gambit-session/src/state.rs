//! The single authoritative session record.

use gambit_protocol::{ServerMessage, Side};

use crate::{Phase, RoleTable};

/// Seats, game state, and phase for the one session a server hosts.
///
/// Owned by the session actor. Nothing outside the actor holds a reference,
/// so every mutation is serialized by construction.
///
/// There is no turn field. Whose turn it is always comes from the rules
/// oracle reading `game`.
#[derive(Debug, Clone)]
pub struct SessionState<S> {
    pub(crate) roles: RoleTable,
    pub(crate) game: S,
    pub(crate) phase: Phase,
}

impl<S> SessionState<S> {
    /// Creates a fresh session: both seats vacant, game at `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            roles: RoleTable::new(),
            game: initial,
            phase: Phase::InProgress,
        }
    }

    /// Seat occupancy.
    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    /// Mutable seat occupancy.
    pub fn roles_mut(&mut self) -> &mut RoleTable {
        &mut self.roles
    }

    /// The current game state.
    pub fn game(&self) -> &S {
        &self.game
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// A serialized view of the game: what clients render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub state: String,
    pub turn: Side,
}

impl Snapshot {
    /// Wraps the snapshot in its wire message.
    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::StateSnapshot {
            state: self.state.clone(),
            turn: self.turn,
        }
    }
}
