// =============================================================================
// The rules-engine seam.
//
// The game session never looks inside a position. Everything it needs to know
// (legal moves, whose turn it is, whether the game has ended) is asked of a
// `RulesEngine`. `StandardRules` is the implementation used in the
// browser and by the native tools.
// =============================================================================

use crate::board::Board;
use crate::error::IllegalMoveError;
use crate::moves::{Move, Square};
use crate::piece::{Color, Piece};

pub trait RulesEngine {
    /// An immutable snapshot of the game. A new value is produced for every
    /// applied move.
    type Position: Clone;

    fn initial_position(&self) -> Self::Position;

    /// Every legal move of the side to move, or only those leaving `origin`.
    fn legal_moves(&self, position: &Self::Position, origin: Option<Square>) -> Vec<Move>;

    fn apply_move(&self, position: &Self::Position, mv: &Move) -> Result<Self::Position, IllegalMoveError>;

    fn turn_to_move(&self, position: &Self::Position) -> Color;

    fn piece_at(&self, position: &Self::Position, square: Square) -> Option<Piece>;

    fn is_checkmate(&self, position: &Self::Position) -> bool;

    fn is_stalemate(&self, position: &Self::Position) -> bool;

    fn is_draw(&self, position: &Self::Position) -> bool;

    /// FEN of the position, handed to the board view for rendering.
    fn fen(&self, position: &Self::Position) -> String;
}

/// Standard chess on [`Board`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardRules;

impl RulesEngine for StandardRules {
    type Position = Board;

    fn initial_position(&self) -> Board {
        Board::new()
    }

    fn legal_moves(&self, position: &Board, origin: Option<Square>) -> Vec<Move> {
        match origin {
            Some(sq) => position.legal_moves_from(sq),
            None => position.generate_legal_moves(position.current_turn),
        }
    }

    fn apply_move(&self, position: &Board, mv: &Move) -> Result<Board, IllegalMoveError> {
        position.play(mv)
    }

    fn turn_to_move(&self, position: &Board) -> Color {
        position.current_turn
    }

    fn piece_at(&self, position: &Board, square: Square) -> Option<Piece> {
        position.piece_at(square)
    }

    fn is_checkmate(&self, position: &Board) -> bool {
        position.is_checkmate()
    }

    fn is_stalemate(&self, position: &Board) -> bool {
        position.is_stalemate()
    }

    fn is_draw(&self, position: &Board) -> bool {
        position.is_draw()
    }

    fn fen(&self, position: &Board) -> String {
        position.to_fen()
    }
}
