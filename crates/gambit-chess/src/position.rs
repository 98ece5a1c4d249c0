//! A chess position with the history a bare board doesn't keep.

use std::str::FromStr;

use chess::{Board, ChessMove, Color, Piece};
use gambit_protocol::Side;

use crate::RulesError;

/// A board plus move counters and the hashes of every position reached.
///
/// Immutable: [`play`](Position::play) returns a new position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    /// Hash of every position since the start, including the current one.
    history: Vec<u64>,
}

impl Position {
    /// The standard starting position.
    pub fn start() -> Self {
        Self::from_board(Board::default(), 0, 1)
    }

    /// Parses a position from Forsyth-Edwards Notation.
    ///
    /// The move counters (fields five and six) are optional and default to
    /// `0` and `1`.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let invalid = |reason: String| RulesError::InvalidFen {
            fen: fen.to_owned(),
            reason,
        };

        let board = Board::from_str(fen).map_err(|e| invalid(e.to_string()))?;

        let mut counters = fen.split_whitespace().skip(4);
        let halfmove_clock = match counters.next() {
            Some(field) => field
                .parse()
                .map_err(|_| invalid(format!("bad halfmove clock {field:?}")))?,
            None => 0,
        };
        let fullmove_number = match counters.next() {
            Some(field) => field
                .parse()
                .map_err(|_| invalid(format!("bad fullmove number {field:?}")))?,
            None => 1,
        };
        if fullmove_number == 0 {
            return Err(invalid("fullmove number starts at 1".into()));
        }

        Ok(Self::from_board(board, halfmove_clock, fullmove_number))
    }

    fn from_board(board: Board, halfmove_clock: u32, fullmove_number: u32) -> Self {
        Self {
            board,
            halfmove_clock,
            fullmove_number,
            history: vec![board.get_hash()],
        }
    }

    /// The underlying board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Plies since the last pawn move or capture.
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Starts at 1 and increments after each Black move.
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn side_to_move(&self) -> Side {
        side_of(self.board.side_to_move())
    }

    /// How many times the current position has occurred, counting now.
    pub fn repetitions(&self) -> usize {
        let current = self.board.get_hash();
        self.history.iter().filter(|h| **h == current).count()
    }

    /// Full FEN, with this position's own move counters.
    pub fn fen(&self) -> String {
        let board = self.board.to_string();
        let placement: Vec<&str> = board.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            placement.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Whether neither side can possibly deliver mate: bare kings, a
    /// single minor piece, or only bishops that all stand on one colour.
    pub fn has_insufficient_material(&self) -> bool {
        let board = &self.board;
        let heavy =
            *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
        if heavy.popcnt() > 0 {
            return false;
        }

        let knights = board.pieces(Piece::Knight).popcnt();
        let bishops = *board.pieces(Piece::Bishop);
        if knights + bishops.popcnt() <= 1 {
            return true;
        }
        if knights > 0 {
            return false;
        }

        let mut shades =
            bishops.map(|sq| (sq.get_file().to_index() + sq.get_rank().to_index()) % 2);
        match shades.next() {
            Some(first) => shades.all(|shade| shade == first),
            None => true,
        }
    }

    /// Plays `mv`, which must already be known to be legal.
    pub(crate) fn play(&self, mv: ChessMove) -> Self {
        let moving = self.board.piece_on(mv.get_source());
        let captures = self.board.piece_on(mv.get_dest()).is_some()
            || (moving == Some(Piece::Pawn)
                && mv.get_source().get_file() != mv.get_dest().get_file());
        let board = self.board.make_move_new(mv);

        let halfmove_clock = if moving == Some(Piece::Pawn) || captures {
            0
        } else {
            self.halfmove_clock + 1
        };
        let fullmove_number = match self.board.side_to_move() {
            Color::Black => self.fullmove_number + 1,
            Color::White => self.fullmove_number,
        };

        let mut history = self.history.clone();
        history.push(board.get_hash());

        Self {
            board,
            halfmove_clock,
            fullmove_number,
            history,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

pub(crate) fn side_of(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}
