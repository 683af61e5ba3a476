// =============================================================================
// FEN import and export for `Board`.
// =============================================================================

use crate::board::{Board, CastlingRights};
use crate::error::ParseError;
use crate::moves::Square;
use crate::piece::{Color, Piece};

pub const INITIAL_POSITION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn fen_error(reason: impl Into<String>) -> ParseError {
    ParseError::Fen(reason.into())
}

impl Board {
    /// Parses a FEN string. The half-move and full-move counters may be
    /// omitted and default to `0 1`.
    pub fn from_fen(fen: &str) -> Result<Board, ParseError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&parts.len()) {
            return Err(fen_error(format!("expected 4 to 6 fields, found {}", parts.len())));
        }

        let mut board = Board::empty();
        let rows: Vec<&str> = parts[0].split('/').collect();
        if rows.len() != 8 {
            return Err(fen_error("expected 8 ranks"));
        }
        for (i, rank) in rows.iter().enumerate() {
            let row = 7 - i;
            let mut col = 0usize;
            for c in rank.chars() {
                if let Some(skip) = c.to_digit(10) {
                    col += skip as usize;
                } else {
                    let piece = Piece::from_fen_char(c)
                        .ok_or_else(|| fen_error(format!("invalid piece character `{c}`")))?;
                    if col > 7 {
                        return Err(fen_error(format!("too many squares on rank {}", row + 1)));
                    }
                    board.put(Square::new(row, col), Some(piece));
                    col += 1;
                }
            }
            if col != 8 {
                return Err(fen_error(format!("rank {} does not cover 8 files", row + 1)));
            }
        }

        board.current_turn = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(fen_error(format!("invalid active color `{other}`"))),
        };

        let mut rights = CastlingRights::none();
        if parts[2] != "-" {
            for c in parts[2].chars() {
                match c {
                    'K' => rights.white_kingside = true,
                    'Q' => rights.white_queenside = true,
                    'k' => rights.black_kingside = true,
                    'q' => rights.black_queenside = true,
                    _ => return Err(fen_error(format!("invalid castling field `{}`", parts[2]))),
                }
            }
        }
        board.castling_rights = rights;

        board.en_passant_target = match parts[3] {
            "-" => None,
            sq => Some(sq.parse().map_err(|_| fen_error(format!("invalid en passant square `{sq}`")))?),
        };

        let counter = |idx: usize, default: u32| -> Result<u32, ParseError> {
            match parts.get(idx) {
                None => Ok(default),
                Some(s) => s.parse().map_err(|_| fen_error(format!("invalid move counter `{s}`"))),
            }
        };
        board.halfmove_clock = counter(4, 0)?;
        board.fullmove_number = counter(5, 1)?;

        if let Some(target) = board.en_passant_target {
            if !board.can_capture_en_passant(target) {
                board.en_passant_target = None;
            }
        }

        board.position_history.push(board.position_hash());
        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for row in (0..8).rev() {
            let mut empty = 0;
            for col in 0..8 {
                match self.piece_at(Square::new(row, col)) {
                    Some(p) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(p.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if row > 0 {
                placement.push('/');
            }
        }

        let turn = match self.current_turn {
            Color::White => "w",
            Color::Black => "b",
        };

        let rights = &self.castling_rights;
        let mut castling: String = [
            (rights.white_kingside, 'K'),
            (rights.white_queenside, 'Q'),
            (rights.black_kingside, 'k'),
            (rights.black_queenside, 'q'),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, c)| *c)
        .collect();
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = self
            .en_passant_target
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{placement} {turn} {castling} {ep} {} {}",
            self.halfmove_clock, self.fullmove_number
        )
    }
}
