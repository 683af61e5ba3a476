use serde::Serialize;

use crate::piece::Color;
use crate::rules::RulesEngine;

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Debug, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    InProgress,
    Checkmate { winner: Color },
    Stalemate,
    Draw,
}

impl GameStatus {
    /// Derive the status of `position` from scratch.
    ///
    /// Checkmate is checked first, then draw, then stalemate. On checkmate the
    /// winner is the side that just moved, i.e. the one not to move now.
    pub fn classify<R: RulesEngine>(rules: &R, position: &R::Position) -> GameStatus {
        if rules.is_checkmate(position) {
            GameStatus::Checkmate { winner: rules.turn_to_move(position).opposite() }
        } else if rules.is_draw(position) {
            GameStatus::Draw
        } else if rules.is_stalemate(position) {
            GameStatus::Stalemate
        } else {
            GameStatus::InProgress
        }
    }

    pub fn is_terminal(self) -> bool {
        self != GameStatus::InProgress
    }

    /// Text for the game-over dialog.
    pub fn message(self) -> Option<String> {
        match self {
            GameStatus::InProgress => None,
            GameStatus::Checkmate { winner } => Some(format!("{} wins by checkmate!", winner.name())),
            GameStatus::Draw => Some("Game ended in a draw!".to_string()),
            GameStatus::Stalemate => Some("Game ended in a stalemate!".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::rules::StandardRules;

    fn status_of(fen: &str) -> GameStatus {
        GameStatus::classify(&StandardRules, &Board::from_fen(fen).unwrap())
    }

    #[test]
    fn checkmate_credits_the_side_that_moved() {
        let status = status_of("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert_eq!(status, GameStatus::Checkmate { winner: Color::Black });
        assert_eq!(status.message().as_deref(), Some("Black wins by checkmate!"));
    }

    #[test]
    fn stalemate_and_draw_are_terminal() {
        assert_eq!(status_of("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1"), GameStatus::Stalemate);
        assert_eq!(status_of("4k3/8/8/8/8/8/8/4K3 w - - 0 1"), GameStatus::Draw);
        assert!(GameStatus::Draw.is_terminal());
        assert!(!GameStatus::InProgress.is_terminal());
        assert_eq!(GameStatus::InProgress.message(), None);
    }

    /// Bare kings with no legal move for the side to move is both stalemate
    /// and a material draw; draw takes precedence.
    #[test]
    fn draw_is_checked_before_stalemate() {
        assert_eq!(status_of("k7/2K5/1B6/8/8/8/8/8 b - - 0 1"), GameStatus::Draw);
    }

    #[test]
    fn serializes_with_a_kind_tag() {
        let json = serde_json::to_value(GameStatus::Checkmate { winner: Color::White }).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "checkmate", "winner": "White" }));
    }
}
