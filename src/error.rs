// =============================================================================
// Error types for the rules engine and the game session.
//
// Move rejections are ordinary values: the session inspects them and turns
// them into a fresh origin selection rather than surfacing them to the user.
// =============================================================================

use crate::moves::{Move, Square};
use crate::piece::Color;

/// Why a rules engine refused to apply a move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMoveError {
    /// The origin square holds no piece.
    #[error("no piece on {0}")]
    EmptyOrigin(Square),

    /// The origin piece belongs to the side that is not to move.
    #[error("{origin} holds a {owner:?} piece but {to_move:?} is to move")]
    WrongSide {
        origin: Square,
        owner: Color,
        to_move: Color,
    },

    /// The piece cannot reach the destination in this position.
    #[error("{0} is not legal in this position")]
    NotLegal(Move),

    /// A pawn reaches the last rank but no promotion piece was given.
    #[error("{0} promotes but names no promotion piece")]
    MissingPromotion(Move),
}

/// Result of a human move attempt that did not change the position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The game already reached a terminal state; reset to play on.
    #[error("the game is over")]
    GameOver,

    #[error(transparent)]
    Illegal(#[from] IllegalMoveError),
}

/// The computer could not find a move it was allowed to play.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComputerMoveError {
    /// The rules engine reported no legal moves for a non-terminal position.
    #[error("rules engine reported no legal moves")]
    NoLegalMoves,

    /// Every listed move was refused when applied.
    #[error("all {tried} listed moves were rejected")]
    AllRejected { tried: usize },
}

/// Textual input (squares, UCI moves, FEN) that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid square `{0}`")]
    Square(String),

    #[error("invalid move `{0}`")]
    Move(String),

    #[error("invalid FEN: {0}")]
    Fen(String),
}
