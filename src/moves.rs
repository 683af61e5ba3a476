use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::piece::PieceType;

/// A board square. Row 0 is rank 1, col 0 is file a.
///
/// Serializes as its algebraic name, e.g. `"e4"`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
#[serde(into = "String", try_from = "String")]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    pub const fn new(row: usize, col: usize) -> Square {
        debug_assert!(row < 8 && col < 8, "square off the board");
        Square { row, col }
    }

    /// The square `dr` ranks and `dc` files away, if it is on the board.
    pub fn offset(self, dr: i32, dc: i32) -> Option<Square> {
        let r = self.row as i32 + dr;
        let c = self.col as i32 + dc;
        if (0..8).contains(&r) && (0..8).contains(&c) {
            Some(Square::new(r as usize, c as usize))
        } else {
            None
        }
    }

    /// All 64 squares, a1 first.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8).flat_map(|r| (0..8).map(move |c| Square::new(r, c)))
    }

    pub fn file_char(self) -> char {
        (b'a' + self.col as u8) as char
    }

    pub fn rank_char(self) -> char {
        (b'1' + self.row as u8) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Square {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [f @ b'a'..=b'h', r @ b'1'..=b'8'] => {
                Ok(Square::new((r - b'1') as usize, (f - b'a') as usize))
            }
            _ => Err(ParseError::Square(s.to_string())),
        }
    }
}

impl From<Square> for String {
    fn from(sq: Square) -> String {
        sq.to_string()
    }
}

impl TryFrom<String> for Square {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Move {
        Move { from, to, promotion: None }
    }

    /// A move built from a click pair: promotes to a queen if it turns out
    /// to be a promoting move.
    pub fn with_default_promotion(from: Square, to: Square) -> Move {
        Move { from, to, promotion: Some(PieceType::Queen) }
    }

    /// Convert to UCI notation, e.g. "e2e4", "a7a8q"
    pub fn to_uci(&self) -> String {
        match self.promotion {
            Some(pt) => format!("{}{}{}", self.from, self.to, pt.letter()),
            None => format!("{}{}", self.from, self.to),
        }
    }

    /// Parse from UCI notation
    pub fn from_uci(s: &str) -> Result<Move, ParseError> {
        let bad = || ParseError::Move(s.to_string());
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(bad());
        }
        let from = s[0..2].parse().map_err(|_| bad())?;
        let to = s[2..4].parse().map_err(|_| bad())?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => match PieceType::from_letter(c) {
                Some(pt) if PieceType::PROMOTIONS.contains(&pt) => Some(pt),
                _ => return Err(bad()),
            },
        };
        Ok(Move { from, to, promotion })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}

impl FromStr for Move {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::from_uci(s)
    }
}
