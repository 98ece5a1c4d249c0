//! Seat bookkeeping: who holds White, who holds Black.
//!
//! Observers are not tracked here; any connection without a seat is an
//! observer by definition.

use gambit_protocol::{Role, RoleSnapshot, Side};
use gambit_transport::ConnectionId;

/// The two exclusive seats.
///
/// Not thread-safe on its own: it lives inside the session actor, which
/// is the only code that ever touches it, so every check-then-assign
/// happens without interleaving.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    white: Option<ConnectionId>,
    black: Option<ConnectionId>,
}

impl RoleTable {
    /// Creates a table with both seats vacant.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `conn` the first vacant seat (White before Black), or makes it
    /// an observer when both are taken.
    ///
    /// A connection that already holds a seat keeps it.
    pub fn assign(&mut self, conn: ConnectionId) -> Role {
        if let Some(side) = self.side_of(conn) {
            return Role::Player(side);
        }
        for side in Side::ALL {
            let seat = self.seat_mut(side);
            if seat.is_none() {
                *seat = Some(conn);
                return Role::Player(side);
            }
        }
        Role::Observer
    }

    /// Frees the seat held by `conn`, returning which one. Observers and
    /// unknown connections are a no-op.
    pub fn vacate(&mut self, conn: ConnectionId) -> Option<Side> {
        let side = self.side_of(conn)?;
        *self.seat_mut(side) = None;
        Some(side)
    }

    /// The seat held by `conn`, if any.
    pub fn side_of(&self, conn: ConnectionId) -> Option<Side> {
        Side::ALL
            .into_iter()
            .find(|side| self.holder(*side) == Some(conn))
    }

    /// The connection holding `side`, if any.
    pub fn holder(&self, side: Side) -> Option<ConnectionId> {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }

    /// Current occupancy, in wire form.
    pub fn snapshot(&self) -> RoleSnapshot {
        RoleSnapshot {
            white: self.white,
            black: self.black,
        }
    }

    fn seat_mut(&mut self, side: Side) -> &mut Option<ConnectionId> {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }
}
