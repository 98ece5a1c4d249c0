//! [`ChessRules`]: the chess rules oracle.

use chess::{BoardStatus, ChessMove, File, Piece, Rank};
use gambit_protocol::{CapturedPiece, DrawRule, MoveSpec, Outcome, PieceKind, Side, Square};
use gambit_session::{OracleError, RulesOracle, Transition};

use crate::position::side_of;
use crate::{Position, RulesError};

/// Plies without a pawn move or capture after which the game is drawn.
const FIFTY_MOVE_PLIES: u32 = 100;

/// Standard chess, optionally from a custom start position.
///
/// A pawn reaching the last rank without a promotion hint becomes a
/// queen. A promotion hint on any other move is ignored.
#[derive(Debug, Clone)]
pub struct ChessRules {
    start: Position,
}

impl ChessRules {
    /// Rules starting from the standard position.
    pub fn new() -> Self {
        Self {
            start: Position::start(),
        }
    }

    /// Rules starting (and resetting) to the position given in FEN.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let start = Position::from_fen(fen)?;
        tracing::debug!(fen = %start.fen(), "custom start position");
        Ok(Self { start })
    }

    /// The position every game (and every reset) begins from.
    pub fn start(&self) -> &Position {
        &self.start
    }
}

impl Default for ChessRules {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesOracle for ChessRules {
    type State = Position;

    fn initial_state(&self) -> Position {
        self.start.clone()
    }

    fn current_turn(&self, state: &Position) -> Side {
        state.side_to_move()
    }

    fn apply(&self, state: &Position, mv: &MoveSpec) -> Result<Transition<Position>, OracleError> {
        let board = state.board();
        let from = to_square(mv.from);
        let to = to_square(mv.to);

        let Some(moving) = board.piece_on(from) else {
            return Err(OracleError::Illegal(format!("no piece on {}", mv.from)));
        };
        if board.color_on(from) != Some(board.side_to_move()) {
            return Err(OracleError::Illegal(format!(
                "{} is not {}'s piece",
                mv.from,
                state.side_to_move()
            )));
        }

        let last_rank = match board.side_to_move() {
            chess::Color::White => 7,
            chess::Color::Black => 0,
        };
        let promotion = (moving == Piece::Pawn && mv.to.rank() == last_rank)
            .then(|| mv.promotion.map_or(Piece::Queen, to_piece));

        let chess_move = ChessMove::new(from, to, promotion);
        if !board.legal(chess_move) {
            return Err(OracleError::Illegal(format!("{mv} is not a legal move")));
        }

        let opponent = state.side_to_move().opponent();
        let captured = match board.piece_on(to) {
            Some(piece) => Some(CapturedPiece {
                side: opponent,
                kind: from_piece(piece),
            }),
            // A pawn changing file onto an empty square took en passant.
            None if moving == Piece::Pawn && from.get_file() != to.get_file() => {
                Some(CapturedPiece {
                    side: opponent,
                    kind: PieceKind::Pawn,
                })
            }
            None => None,
        };

        Ok(Transition {
            state: state.play(chess_move),
            captured,
        })
    }

    fn terminal_status(&self, state: &Position) -> Option<Outcome> {
        match state.board().status() {
            BoardStatus::Checkmate => {
                return Some(Outcome::Checkmate {
                    winner: side_of(!state.board().side_to_move()),
                });
            }
            BoardStatus::Stalemate => return Some(Outcome::Stalemate),
            BoardStatus::Ongoing => {}
        }

        let rule = if state.halfmove_clock() >= FIFTY_MOVE_PLIES {
            DrawRule::FiftyMoveRule
        } else if state.has_insufficient_material() {
            DrawRule::InsufficientMaterial
        } else if state.repetitions() >= 3 {
            DrawRule::ThreefoldRepetition
        } else {
            return None;
        };
        Some(Outcome::Draw { rule })
    }

    fn serialize(&self, state: &Position) -> String {
        state.fen()
    }
}

fn to_square(square: Square) -> chess::Square {
    chess::Square::make_square(
        Rank::from_index(usize::from(square.rank())),
        File::from_index(usize::from(square.file())),
    )
}

fn to_piece(kind: PieceKind) -> Piece {
    match kind {
        PieceKind::Pawn => Piece::Pawn,
        PieceKind::Knight => Piece::Knight,
        PieceKind::Bishop => Piece::Bishop,
        PieceKind::Rook => Piece::Rook,
        PieceKind::Queen => Piece::Queen,
        PieceKind::King => Piece::King,
    }
}

fn from_piece(piece: Piece) -> PieceKind {
    match piece {
        Piece::Pawn => PieceKind::Pawn,
        Piece::Knight => PieceKind::Knight,
        Piece::Bishop => PieceKind::Bishop,
        Piece::Rook => PieceKind::Rook,
        Piece::Queen => PieceKind::Queen,
        Piece::King => PieceKind::King,
    }
}
