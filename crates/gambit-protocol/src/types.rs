//! Core protocol types for Gambit's wire format.
//!
//! Every type here is serialized to JSON and sent over a WebSocket. The
//! serde attributes are part of the contract with browser clients: a
//! renamed variant is a breaking protocol change.

use std::fmt;

use gambit_transport::ConnectionId;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{MoveSpec, PieceKind, ProtocolError};

// ---------------------------------------------------------------------------
// Sides and roles
// ---------------------------------------------------------------------------

/// One of the two exclusive player seats.
///
/// White is the first seat handed out and moves first. On the wire the
/// sides are the single letters `"w"` and `"b"`, which is what board
/// widgets expect when deciding which way up to draw the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl Side {
    /// Both seats, in assignment order.
    pub const ALL: [Side; 2] = [Side::White, Side::Black];

    /// The other seat.
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => f.write_str("white"),
            Self::Black => f.write_str("black"),
        }
    }
}

/// What a connection is allowed to do for its whole lifetime.
///
/// Players hold a seat and may move on their turn. Observers can watch
/// and request a reset, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Player(Side),
    Observer,
}

impl Role {
    /// The seat this role holds, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Self::Player(side) => Some(side),
            Self::Observer => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(side) => side.fmt(f),
            Self::Observer => f.write_str("observer"),
        }
    }
}

/// Who is sitting in each seat right now. `None` means vacant.
///
/// Serializes as `{ "white": 4, "black": null }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSnapshot {
    pub white: Option<ConnectionId>,
    pub black: Option<ConnectionId>,
}

impl RoleSnapshot {
    /// Returns the connection holding `side`, if any.
    pub fn holder(&self, side: Side) -> Option<ConnectionId> {
        match side {
            Side::White => self.white,
            Side::Black => self.black,
        }
    }
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

/// A move exactly as the client sent it.
///
/// Kept as raw strings so a rejection can echo the payload back, letting
/// the client undo its optimistic board update. Every field is optional
/// on the wire: a move frame with a missing or non-string square still
/// decodes, and is refused by [`parse`](Self::parse) instead of failing
/// to decode. Non-string values are dropped from the echo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub from: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub to: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub promotion: Option<String>,
}

impl MoveRequest {
    /// A request from `from` to `to`, with no promotion hint.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            promotion: None,
        }
    }

    /// Adds a promotion hint.
    pub fn with_promotion(mut self, promotion: impl Into<String>) -> Self {
        self.promotion = Some(promotion.into());
        self
    }

    /// Validates the payload's structure.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedMove`] for a missing or unknown
    /// square, or a promotion hint that isn't `q`, `r`, `b` or `n`.
    pub fn parse(&self) -> Result<MoveSpec, ProtocolError> {
        let promotion = self
            .promotion
            .as_deref()
            .map(PieceKind::from_promotion)
            .transpose()?;
        Ok(MoveSpec {
            from: required(self.from.as_deref(), "from")?.parse()?,
            to: required(self.to.as_deref(), "to")?.parse()?,
            promotion,
        })
    }
}

fn required<'a>(field: Option<&'a str>, name: &str) -> Result<&'a str, ProtocolError> {
    field.ok_or_else(|| ProtocolError::MalformedMove(format!("missing `{name}` square")))
}

/// Reads a string, treating any other JSON value (or `null`) as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Field>::deserialize(deserializer)? {
        Some(Field::Text(text)) => Some(text),
        Some(Field::Other(_)) | None => None,
    })
}

/// A piece taken off the board by an applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedPiece {
    pub side: Side,
    pub kind: PieceKind,
}

/// Why a move was bounced back to its sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The sender holds no seat, it isn't their turn, or the game is over.
    NotYourTurn,
    /// The move is malformed or breaks the rules.
    Illegal,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Which draw rule ended the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawRule {
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

/// How a finished game ended.
///
/// Internally tagged on `reason`:
/// `{ "reason": "checkmate", "winner": "w" }`, `{ "reason": "stalemate" }`,
/// `{ "reason": "draw", "rule": "threefold_repetition" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Checkmate { winner: Side },
    Stalemate,
    Draw { rule: DrawRule },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkmate { winner } => write!(f, "checkmate, {winner} wins"),
            Self::Stalemate => f.write_str("stalemate"),
            Self::Draw { rule } => write!(f, "draw ({rule:?})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a client may send.
///
/// ```json
/// { "type": "move", "from": "e7", "to": "e8", "promotion": "q" }
/// { "type": "reset" }
/// { "type": "ping", "client_time": 1712 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submit a move for the sender's seat.
    Move(MoveRequest),
    /// Put the game back at the start position. Anyone may ask.
    Reset,
    /// Keep-alive; answered with [`ServerMessage::Pong`].
    Ping { client_time: u64 },
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Everything the server may send. Always wrapped in an [`Envelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Unicast: "you hold this seat".
    RoleAssigned { side: Side },

    /// Unicast: "both seats are taken, you are watching".
    ObserverAssigned,

    /// Broadcast whenever seat occupancy changes.
    RolesChanged { roles: RoleSnapshot },

    /// Broadcast when a seated player drops, right before the
    /// accompanying [`RolesChanged`](Self::RolesChanged).
    PlayerLeft { side: Side },

    /// Broadcast: a move was applied. Always followed by a
    /// [`StateSnapshot`](Self::StateSnapshot).
    MoveApplied {
        #[serde(rename = "move")]
        request: MoveRequest,
        captured: Option<CapturedPiece>,
    },

    /// The full serialized game state and whose turn it is. Broadcast after
    /// every applied move and every reset; unicast to newcomers.
    StateSnapshot { state: String, turn: Side },

    /// Unicast: the sender's move was refused. `move` is the payload it
    /// sent, unchanged.
    MoveRejected {
        #[serde(rename = "move")]
        request: MoveRequest,
        reason: RejectReason,
    },

    /// Broadcast: the game is over. Moves are refused until a reset.
    SessionEnded { outcome: Outcome },

    /// Unicast reply to a ping.
    Pong { client_time: u64 },

    /// Unicast: the last frame could not be understood. `code` follows HTTP
    /// conventions (400 = bad request).
    Error { code: u16, message: String },
}

/// The outer wrapper of every server frame.
///
/// `seq` comes from a single per-session counter, so it is strictly
/// increasing on each connection. Gaps are normal: they are events that
/// went to other connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub seq: u64,
    pub payload: ServerMessage,
}

// =========================================================================
// Tests
// =========================================================================
