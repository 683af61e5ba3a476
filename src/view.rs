// =============================================================================
// What the board view renders, recomputed from the session after every event.
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use crate::moves::Square;
use crate::piece::{Color, Piece};
use crate::rules::RulesEngine;
use crate::session::GameSession;
use crate::status::GameStatus;
use crate::timer::ScheduledMove;

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    /// Origin of the move being entered.
    SelectedOrigin,
    /// A square the selected piece may move to.
    LegalDestination,
    /// Marker toggled by right-clicking.
    Annotation,
}

impl Highlight {
    /// CSS background for the square.
    pub fn background(self) -> &'static str {
        match self {
            Highlight::SelectedOrigin => "rgba(255, 255, 0, 0.4)",
            Highlight::LegalDestination => "radial-gradient(circle, rgba(0,0,0,.1) 25%, transparent 25%)",
            Highlight::Annotation => "rgba(0, 0, 255, 0.4)",
        }
    }
}

#[derive(Clone, Serialize, Debug)]
pub struct BoardView {
    pub fen: String,
    pub pieces: BTreeMap<Square, Piece>,
    pub turn: Color,
    pub selection: Option<Square>,
    pub highlights: BTreeMap<Square, Highlight>,
    pub status: GameStatus,
    pub game_over: bool,
    /// Game-over dialog text.
    pub message: Option<String>,
    /// Non-fatal notice, e.g. after the computer forced a reset.
    pub notice: Option<String>,
    pub pending_computer_move: Option<ScheduledMove>,
}

impl BoardView {
    pub fn of<R: RulesEngine>(session: &GameSession<R>) -> BoardView {
        let rules = session.rules();
        let position = session.position();
        let pieces = Square::all()
            .filter_map(|sq| rules.piece_at(position, sq).map(|p| (sq, p)))
            .collect();

        // Selection markers win over annotations on the same square.
        let mut highlights: BTreeMap<Square, Highlight> = session
            .annotations()
            .iter()
            .map(|&sq| (sq, Highlight::Annotation))
            .collect();
        if let Some(origin) = session.selection() {
            highlights.insert(origin, Highlight::SelectedOrigin);
        }
        for &sq in session.destinations() {
            highlights.insert(sq, Highlight::LegalDestination);
        }

        let status = session.status();
        BoardView {
            fen: rules.fen(position),
            pieces,
            turn: session.turn(),
            selection: session.selection(),
            highlights,
            status,
            game_over: status.is_terminal(),
            message: status.message(),
            notice: session.notice().map(str::to_string),
            pending_computer_move: session.pending_computer_move(),
        }
    }

    /// Square to CSS background, ready for the board component.
    pub fn square_styles(&self) -> BTreeMap<Square, &'static str> {
        self.highlights
            .iter()
            .map(|(&sq, &h)| (sq, h.background()))
            .collect()
    }
}
