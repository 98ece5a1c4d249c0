//! Session configuration and phase state machine.

use gambit_protocol::Outcome;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session actor.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the actor's command channel. When full, callers wait
    /// (bounded channel backpressure).
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { command_buffer: 64 }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Whether the session is accepting moves.
///
/// ```text
///              terminal move               reset (anyone)
/// InProgress ───────────────→ Ended ───────────────────→ InProgress
///      ↑                                                      │
///      └────────────────── reset (anyone) ────────────────────┘
/// ```
///
/// A reset is valid from either phase. Ending is only valid while in
/// progress: a finished game cannot finish again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Moves are accepted from the player whose turn it is.
    #[default]
    InProgress,
    /// The game is over; moves are refused until a reset.
    Ended(Outcome),
}

impl Phase {
    /// Returns `true` if moves may be submitted.
    pub fn accepts_moves(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// The outcome of the finished game, if it has finished.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Self::InProgress => None,
            Self::Ended(outcome) => Some(*outcome),
        }
    }

    /// Returns `Some(Ended)` if the game may end now, `None` if it has
    /// already ended.
    pub fn end(self, outcome: Outcome) -> Option<Self> {
        match self {
            Self::InProgress => Some(Self::Ended(outcome)),
            Self::Ended(_) => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "InProgress"),
            Self::Ended(outcome) => write!(f, "Ended({outcome})"),
        }
    }
}
