//! Board notation: squares, piece kinds, and validated moves.
//!
//! Clients send moves as loose strings (`"e2"`, `"q"`). Before anything
//! reaches the rules engine, those strings are parsed into the typed
//! [`MoveSpec`] defined here. Anything that fails to parse never gets
//! further than the session boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A square on an 8x8 board, stored as zero-based file and rank.
///
/// `a1` is `(0, 0)`, `h8` is `(7, 7)`. The fields are private so a
/// `Square` is always on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Creates a square from zero-based file and rank, or `None` if either
    /// is off the board.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    /// Zero-based file (`a` = 0).
    pub fn file(self) -> u8 {
        self.file
    }

    /// Zero-based rank (`1` = 0).
    pub fn rank(self) -> u8 {
        self.rank
    }
}

impl FromStr for Square {
    type Err = ProtocolError;

    /// Parses algebraic notation. Case-insensitive: `"E2"` and `"e2"` name
    /// the same square.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ProtocolError::MalformedMove(format!("bad square {s:?}")));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(file, rank)
            .ok_or_else(|| ProtocolError::MalformedMove(format!("bad square {s:?}")))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

// ---------------------------------------------------------------------------
// PieceKind
// ---------------------------------------------------------------------------

/// The kind of a chess piece, serialized with the usual one-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    #[serde(rename = "p")]
    Pawn,
    #[serde(rename = "n")]
    Knight,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "k")]
    King,
}

impl PieceKind {
    /// Parses a promotion hint. Only queen, rook, bishop and knight are
    /// valid promotion targets.
    pub fn from_promotion(letter: &str) -> Result<Self, ProtocolError> {
        match letter.to_ascii_lowercase().as_str() {
            "q" => Ok(Self::Queen),
            "r" => Ok(Self::Rook),
            "b" => Ok(Self::Bishop),
            "n" => Ok(Self::Knight),
            other => Err(ProtocolError::MalformedMove(format!(
                "bad promotion piece {other:?}"
            ))),
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// MoveSpec
// ---------------------------------------------------------------------------

/// A structurally valid move: two on-board squares and an optional
/// promotion target. Whether it is *legal* is for the rules engine to say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSpec {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl fmt::Display for MoveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "={kind}")?;
        }
        Ok(())
    }
}
