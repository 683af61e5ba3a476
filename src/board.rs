use serde::{Deserialize, Serialize};

use crate::error::IllegalMoveError;
use crate::moves::{Move, Square};
use crate::piece::{Color, Piece, PieceType};

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, -1),
    (0, 1), (1, -1), (1, 0), (1, 1),
];

const STRAIGHT_DIRS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL_DIRS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook, PieceType::Knight, PieceType::Bishop, PieceType::Queen,
    PieceType::King, PieceType::Bishop, PieceType::Knight, PieceType::Rook,
];

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub fn all() -> Self {
        CastlingRights {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub fn none() -> Self {
        CastlingRights {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    fn revoke(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Drop the right tied to a rook's home corner once anything leaves or
    /// lands on it.
    fn touch_corner(&mut self, sq: Square) {
        match (sq.row, sq.col) {
            (0, 0) => self.white_queenside = false,
            (0, 7) => self.white_kingside = false,
            (7, 0) => self.black_queenside = false,
            (7, 7) => self.black_kingside = false,
            _ => {}
        }
    }
}

/// A chess position. Values are treated as immutable snapshots: [`Board::play`]
/// returns a new board and leaves `self` untouched.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Board {
    pub squares: [[Option<Piece>; 8]; 8],
    pub current_turn: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_target: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    /// Hashes of every position reached so far, current one included.
    pub position_history: Vec<u64>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with no pieces. Useful for setting up test positions.
    pub fn empty() -> Self {
        Board {
            squares: [[None; 8]; 8],
            current_turn: Color::White,
            castling_rights: CastlingRights::none(),
            en_passant_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            position_history: Vec::new(),
        }
    }

    /// The standard starting position.
    pub fn new() -> Self {
        let mut board = Board::empty();
        for (col, &pt) in BACK_RANK.iter().enumerate() {
            board.squares[0][col] = Some(Piece::new(pt, Color::White));
            board.squares[1][col] = Some(Piece::new(PieceType::Pawn, Color::White));
            board.squares[6][col] = Some(Piece::new(PieceType::Pawn, Color::Black));
            board.squares[7][col] = Some(Piece::new(pt, Color::Black));
        }
        board.castling_rights = CastlingRights::all();
        board.position_history.push(board.position_hash());
        board
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.row][sq.col]
    }

    pub fn put(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.row][sq.col] = piece;
    }

    fn holds(&self, sq: Square, color: Color, kinds: &[PieceType]) -> bool {
        self.piece_at(sq)
            .map(|p| p.color == color && kinds.contains(&p.piece_type))
            .unwrap_or(false)
    }

    fn is_own(&self, sq: Square, color: Color) -> bool {
        self.piece_at(sq).map(|p| p.color == color).unwrap_or(false)
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        Square::all().find(|&sq| self.holds(sq, color, &[PieceType::King]))
    }

    /// First occupied square walking from `from` in direction `(dr, dc)`.
    fn first_blocker(&self, from: Square, (dr, dc): (i32, i32)) -> Option<Square> {
        let mut cur = from.offset(dr, dc);
        while let Some(sq) = cur {
            if self.piece_at(sq).is_some() {
                return Some(sq);
            }
            cur = sq.offset(dr, dc);
        }
        None
    }

    /// True if a piece of `attacker` of one of `kinds` stands a single step
    /// away from `sq` along one of `offsets`.
    fn attacked_by_step(&self, sq: Square, offsets: &[(i32, i32)], attacker: Color, kinds: &[PieceType]) -> bool {
        offsets
            .iter()
            .filter_map(|&(dr, dc)| sq.offset(dr, dc))
            .any(|from| self.holds(from, attacker, kinds))
    }

    fn attacked_by_slider(&self, sq: Square, dirs: &[(i32, i32)], attacker: Color, kinds: &[PieceType]) -> bool {
        dirs.iter()
            .filter_map(|&dir| self.first_blocker(sq, dir))
            .any(|from| self.holds(from, attacker, kinds))
    }

    pub fn is_square_attacked_by(&self, sq: Square, attacker: Color) -> bool {
        // A pawn one rank behind the target (from the attacker's view) on an
        // adjacent file attacks it.
        let behind = match attacker {
            Color::White => -1,
            Color::Black => 1,
        };
        self.attacked_by_step(sq, &KNIGHT_OFFSETS, attacker, &[PieceType::Knight])
            || self.attacked_by_step(sq, &KING_OFFSETS, attacker, &[PieceType::King])
            || self.attacked_by_step(sq, &[(behind, -1), (behind, 1)], attacker, &[PieceType::Pawn])
            || self.attacked_by_slider(sq, &STRAIGHT_DIRS, attacker, &[PieceType::Rook, PieceType::Queen])
            || self.attacked_by_slider(sq, &DIAGONAL_DIRS, attacker, &[PieceType::Bishop, PieceType::Queen])
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        self.find_king(color)
            .map(|king| self.is_square_attacked_by(king, color.opposite()))
            .unwrap_or(false)
    }

    pub fn position_hash(&self) -> u64 {
        let mut hash: u64 = 0;
        for sq in Square::all() {
            if let Some(p) = self.piece_at(sq) {
                let piece_val = match p.piece_type {
                    PieceType::Pawn => 1u64,
                    PieceType::Knight => 2,
                    PieceType::Bishop => 3,
                    PieceType::Rook => 4,
                    PieceType::Queen => 5,
                    PieceType::King => 6,
                };
                let color_val = if p.color == Color::White { 0u64 } else { 7u64 };
                let index = (sq.row * 8 + sq.col) as u64;
                hash ^= (piece_val + color_val)
                    .wrapping_mul(0x9e3779b97f4a7c15u64.wrapping_add(index.wrapping_mul(0x517cc1b727220a95)));
            }
        }
        if self.current_turn == Color::Black { hash ^= 0xdeadbeefcafe1234; }
        let rights = &self.castling_rights;
        if rights.white_kingside { hash ^= 0x1; }
        if rights.white_queenside { hash ^= 0x2; }
        if rights.black_kingside { hash ^= 0x4; }
        if rights.black_queenside { hash ^= 0x8; }
        if let Some(ep) = self.en_passant_target {
            hash ^= ((ep.row * 8 + ep.col) as u64).wrapping_mul(0xabcdef0123456789);
        }
        hash
    }

    pub fn is_threefold_repetition(&self) -> bool {
        if self.position_history.len() < 5 {
            return false;
        }
        let current = self.position_hash();
        // The current position is already recorded, so three entries means
        // three occurrences.
        self.position_history.iter().filter(|&&h| h == current).count() >= 3
    }

    pub fn has_insufficient_material(&self) -> bool {
        let material: Vec<(Square, PieceType)> = Square::all()
            .filter_map(|sq| self.piece_at(sq).map(|p| (sq, p.piece_type)))
            .filter(|&(_, pt)| pt != PieceType::King)
            .collect();
        let shade = |sq: Square| (sq.row + sq.col) % 2;
        match material.as_slice() {
            [] => true,
            [(_, lone)] => lone.is_minor(),
            // Bishops of either side, all on one square colour.
            [(first, _), ..] => material
                .iter()
                .all(|&(sq, pt)| pt == PieceType::Bishop && shade(sq) == shade(*first)),
        }
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Pseudo-legal moves: may leave the mover's own king in check.
    pub fn generate_moves(&self, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for from in Square::all() {
            if let Some(piece) = self.piece_at(from) {
                if piece.color == color {
                    self.generate_piece_moves(from, piece, &mut moves);
                }
            }
        }
        moves
    }

    fn generate_piece_moves(&self, from: Square, piece: Piece, moves: &mut Vec<Move>) {
        let color = piece.color;
        match piece.piece_type {
            PieceType::Pawn => self.generate_pawn_moves(from, color, moves),
            PieceType::Knight => self.generate_step_moves(from, color, &KNIGHT_OFFSETS, moves),
            PieceType::Bishop => self.generate_sliding_moves(from, color, &DIAGONAL_DIRS, moves),
            PieceType::Rook => self.generate_sliding_moves(from, color, &STRAIGHT_DIRS, moves),
            PieceType::Queen => {
                self.generate_sliding_moves(from, color, &STRAIGHT_DIRS, moves);
                self.generate_sliding_moves(from, color, &DIAGONAL_DIRS, moves);
            }
            PieceType::King => {
                self.generate_step_moves(from, color, &KING_OFFSETS, moves);
                self.generate_castling_moves(from, color, moves);
            }
        }
    }

    fn push_pawn_move(from: Square, to: Square, promo_row: usize, moves: &mut Vec<Move>) {
        if to.row == promo_row {
            for pt in PieceType::PROMOTIONS {
                moves.push(Move { from, to, promotion: Some(pt) });
            }
        } else {
            moves.push(Move::new(from, to));
        }
    }

    fn generate_pawn_moves(&self, from: Square, color: Color, moves: &mut Vec<Move>) {
        let (dir, start_row, promo_row): (i32, usize, usize) = match color {
            Color::White => (1, 1, 7),
            Color::Black => (-1, 6, 0),
        };

        if let Some(one) = from.offset(dir, 0).filter(|&sq| self.piece_at(sq).is_none()) {
            Self::push_pawn_move(from, one, promo_row, moves);
            if from.row == start_row {
                if let Some(two) = one.offset(dir, 0).filter(|&sq| self.piece_at(sq).is_none()) {
                    moves.push(Move::new(from, two));
                }
            }
        }

        for to in [from.offset(dir, -1), from.offset(dir, 1)].into_iter().flatten() {
            let is_capture = self
                .piece_at(to)
                .map(|p| p.color != color)
                .unwrap_or(false);
            if is_capture || self.en_passant_target == Some(to) {
                Self::push_pawn_move(from, to, promo_row, moves);
            }
        }
    }

    fn generate_step_moves(&self, from: Square, color: Color, offsets: &[(i32, i32)], moves: &mut Vec<Move>) {
        for &(dr, dc) in offsets {
            if let Some(to) = from.offset(dr, dc) {
                if !self.is_own(to, color) {
                    moves.push(Move::new(from, to));
                }
            }
        }
    }

    fn generate_sliding_moves(&self, from: Square, color: Color, dirs: &[(i32, i32)], moves: &mut Vec<Move>) {
        for &(dr, dc) in dirs {
            let mut cur = from.offset(dr, dc);
            while let Some(to) = cur {
                match self.piece_at(to) {
                    Some(p) => {
                        if p.color != color {
                            moves.push(Move::new(from, to));
                        }
                        break;
                    }
                    None => moves.push(Move::new(from, to)),
                }
                cur = to.offset(dr, dc);
            }
        }
    }

    fn generate_castling_moves(&self, from: Square, color: Color, moves: &mut Vec<Move>) {
        let back_rank = match color {
            Color::White => 0,
            Color::Black => 7,
        };
        if from != Square::new(back_rank, 4) || self.is_in_check(color) {
            return;
        }
        let enemy = color.opposite();
        let empty = |cols: [usize; 2]| cols.iter().all(|&c| self.piece_at(Square::new(back_rank, c)).is_none());
        let safe = |cols: [usize; 2]| cols.iter().all(|&c| !self.is_square_attacked_by(Square::new(back_rank, c), enemy));
        let rook_home = |col| self.holds(Square::new(back_rank, col), color, &[PieceType::Rook]);

        // The king may not pass through or land on an attacked square.
        if self.castling_rights.kingside(color) && empty([5, 6]) && rook_home(7) && safe([5, 6]) {
            moves.push(Move::new(from, Square::new(back_rank, 6)));
        }
        if self.castling_rights.queenside(color)
            && empty([2, 3])
            && self.piece_at(Square::new(back_rank, 1)).is_none()
            && rook_home(0)
            && safe([2, 3])
        {
            moves.push(Move::new(from, Square::new(back_rank, 2)));
        }
    }

    pub fn generate_legal_moves(&self, color: Color) -> Vec<Move> {
        self.generate_moves(color)
            .into_iter()
            .filter(|m| self.keeps_king_safe(m, color))
            .collect()
    }

    /// Legal moves of the side to move, starting on `origin`.
    pub fn legal_moves_from(&self, origin: Square) -> Vec<Move> {
        let piece = match self.piece_at(origin) {
            Some(p) if p.color == self.current_turn => p,
            _ => return Vec::new(),
        };
        let mut moves = Vec::new();
        self.generate_piece_moves(origin, piece, &mut moves);
        moves.retain(|m| self.keeps_king_safe(m, piece.color));
        moves
    }

    fn keeps_king_safe(&self, m: &Move, color: Color) -> bool {
        let mut clone = self.clone();
        clone.apply_unchecked(m);
        !clone.is_in_check(color)
    }

    /// Play `mv` for the side to move and return the resulting position.
    ///
    /// A promotion piece on a move that does not promote is ignored. A
    /// promoting move without one is rejected.
    pub fn play(&self, mv: &Move) -> Result<Board, IllegalMoveError> {
        let piece = self.piece_at(mv.from).ok_or(IllegalMoveError::EmptyOrigin(mv.from))?;
        if piece.color != self.current_turn {
            return Err(IllegalMoveError::WrongSide {
                origin: mv.from,
                owner: piece.color,
                to_move: self.current_turn,
            });
        }

        let candidates: Vec<Move> = self
            .legal_moves_from(mv.from)
            .into_iter()
            .filter(|m| m.to == mv.to)
            .collect();
        let chosen = match candidates.as_slice() {
            [] => return Err(IllegalMoveError::NotLegal(*mv)),
            [only] if only.promotion.is_none() => *only,
            promoting => {
                let promotion = mv.promotion.ok_or(IllegalMoveError::MissingPromotion(*mv))?;
                promoting
                    .iter()
                    .find(|m| m.promotion == Some(promotion))
                    .copied()
                    .ok_or(IllegalMoveError::NotLegal(*mv))?
            }
        };

        let mut next = self.clone();
        next.apply_unchecked(&chosen);
        Ok(next)
    }

    /// Apply a move without any legality check. The move must come from the
    /// move generator.
    fn apply_unchecked(&mut self, m: &Move) {
        let piece = match self.piece_at(m.from) {
            Some(p) => p,
            None => return,
        };
        let is_pawn_move = piece.piece_type == PieceType::Pawn;
        let mut is_capture = self.piece_at(m.to).is_some();

        if is_pawn_move && Some(m.to) == self.en_passant_target {
            self.put(Square::new(m.from.row, m.to.col), None);
            is_capture = true;
        }

        let placed = match m.promotion {
            Some(pt) => Piece::new(pt, piece.color),
            None => piece,
        };
        self.put(m.to, Some(placed));
        self.put(m.from, None);

        if piece.piece_type == PieceType::King {
            let rank = m.from.row;
            match m.to.col as i32 - m.from.col as i32 {
                2 => {
                    self.put(Square::new(rank, 5), self.piece_at(Square::new(rank, 7)));
                    self.put(Square::new(rank, 7), None);
                }
                -2 => {
                    self.put(Square::new(rank, 3), self.piece_at(Square::new(rank, 0)));
                    self.put(Square::new(rank, 0), None);
                }
                _ => {}
            }
            self.castling_rights.revoke(piece.color);
        }
        self.castling_rights.touch_corner(m.from);
        self.castling_rights.touch_corner(m.to);

        self.en_passant_target = None;

        if is_pawn_move || is_capture {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        if self.current_turn == Color::Black {
            self.fullmove_number += 1;
        }
        self.current_turn = self.current_turn.opposite();
        if is_pawn_move && m.from.row.abs_diff(m.to.row) == 2 {
            let passed = Square::new((m.from.row + m.to.row) / 2, m.from.col);
            if self.can_capture_en_passant(passed) {
                self.en_passant_target = Some(passed);
            }
        }
        self.position_history.push(self.position_hash());
    }

    /// Whether the side to move has a legal en passant capture onto `target`.
    /// Only then does the square count as part of the position.
    pub(crate) fn can_capture_en_passant(&self, target: Square) -> bool {
        let color = self.current_turn;
        let behind = match color {
            Color::White => -1,
            Color::Black => 1,
        };
        let mut with_target = self.clone();
        with_target.en_passant_target = Some(target);
        [-1, 1]
            .into_iter()
            .filter_map(|dc| target.offset(behind, dc))
            .filter(|&from| self.holds(from, color, &[PieceType::Pawn]))
            .any(|from| with_target.keeps_king_safe(&Move::new(from, target), color))
    }

    fn has_legal_move(&self) -> bool {
        !self.generate_legal_moves(self.current_turn).is_empty()
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_in_check(self.current_turn) && !self.has_legal_move()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_in_check(self.current_turn) && !self.has_legal_move()
    }

    /// Fifty-move rule, threefold repetition or insufficient material.
    /// Stalemate is reported separately by [`Board::is_stalemate`].
    pub fn is_draw(&self) -> bool {
        self.is_fifty_move_draw() || self.is_threefold_repetition() || self.has_insufficient_material()
    }
}
