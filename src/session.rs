// =============================================================================
// The game session controller.
//
// A `GameSession` owns the current position, the human's half-entered move,
// right-click annotations, the game status and the computer's pending reply.
// It changes only through the operations below, each of which runs to
// completion; the board view reads `GameSession::view` afterwards.
//
// Turn flow: a click selects an origin or completes a move. When an accepted
// move hands the turn to the computer, a `ScheduledMove` ticket is issued.
// The host waits out the delay and calls
// `GameSession::fire_computer_move`. Any later move or reset invalidates
// the ticket, so the reply can never land on a position it was not meant for.
// =============================================================================

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::engine::{pick_move, RandomSource};
use crate::error::MoveError;
use crate::moves::{Move, Square};
use crate::piece::{Color, PieceType};
use crate::rules::{RulesEngine, StandardRules};
use crate::status::GameStatus;
use crate::timer::{MoveTimer, ScheduledMove};
use crate::view::BoardView;

/// Shown after the computer failed to find a playable move.
pub const RESET_NOTICE: &str = "AI could not move; game reset";

/// What happened when the computer was asked to move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ComputerTurn {
    Played(Move),
    /// Not the computer's turn, the game is over, or the ticket was stale.
    Skipped,
    /// No playable move was found; the session restarted.
    Reset,
}

pub struct GameSession<R: RulesEngine = StandardRules> {
    rules: R,
    config: SessionConfig,
    position: R::Position,
    selection: Option<Square>,
    destinations: Vec<Square>,
    annotations: BTreeSet<Square>,
    status: GameStatus,
    timer: MoveTimer,
    rng: RandomSource,
    notice: Option<String>,
}

impl GameSession<StandardRules> {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_rules(StandardRules, config)
    }
}

impl<R: RulesEngine> GameSession<R> {
    pub fn with_rules(rules: R, config: SessionConfig) -> Self {
        let position = rules.initial_position();
        let rng = RandomSource::from_seed(config.seed);
        let mut session = GameSession {
            rules,
            config,
            position,
            selection: None,
            destinations: Vec::new(),
            annotations: BTreeSet::new(),
            status: GameStatus::InProgress,
            timer: MoveTimer::new(),
            rng,
            notice: None,
        };
        session.restart();
        session
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn position(&self) -> &R::Position {
        &self.position
    }

    pub fn turn(&self) -> Color {
        self.rules.turn_to_move(&self.position)
    }

    pub fn selection(&self) -> Option<Square> {
        self.selection
    }

    /// Legal destinations of the selected origin, sorted, one per square.
    pub fn destinations(&self) -> &[Square] {
        &self.destinations
    }

    pub fn annotations(&self) -> &BTreeSet<Square> {
        &self.annotations
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn pending_computer_move(&self) -> Option<ScheduledMove> {
        self.timer.pending()
    }

    pub fn is_computer_turn(&self) -> bool {
        self.config.computer_side == Some(self.turn())
    }

    pub fn view(&self) -> BoardView {
        BoardView::of(self)
    }

    /// Left click on `square`: starts a move, or completes the one in progress.
    /// Returns the move played, if any.
    pub fn on_square_click(&mut self, square: Square) -> Option<Move> {
        if self.status.is_terminal() {
            debug!(%square, "click ignored, game is over");
            return None;
        }
        match self.selection {
            None => {
                self.select_origin(square);
                None
            }
            Some(origin) => self.attempt_move(origin, square).ok(),
        }
    }

    /// Right click toggles an annotation. It never touches game state.
    pub fn on_square_right_click(&mut self, square: Square) {
        if !self.annotations.remove(&square) {
            self.annotations.insert(square);
        }
    }

    /// Make `square` the origin of the next move if nothing is selected yet
    /// and it holds a piece of the side to move. Returns whether it did.
    pub fn select_origin(&mut self, square: Square) -> bool {
        if self.selection.is_some() || self.status.is_terminal() {
            return false;
        }
        match self.rules.piece_at(&self.position, square) {
            Some(piece) if piece.color == self.turn() => {}
            _ => {
                debug!(%square, "nothing to select");
                return false;
            }
        }

        let mut destinations: Vec<Square> = self
            .rules
            .legal_moves(&self.position, Some(square))
            .into_iter()
            .map(|m| m.to)
            .collect();
        destinations.sort();
        destinations.dedup();
        debug!(%square, destinations = destinations.len(), "origin selected");

        self.selection = Some(square);
        self.destinations = destinations;
        true
    }

    /// Try `origin` to `dest`, promoting to a queen if the move promotes.
    ///
    /// A refused move is not an error for the player: the selection is
    /// cleared and `dest` is tried as a new origin instead.
    pub fn attempt_move(&mut self, origin: Square, dest: Square) -> Result<Move, MoveError> {
        if self.status.is_terminal() {
            return Err(MoveError::GameOver);
        }
        let candidate = Move::with_default_promotion(origin, dest);
        match self.rules.apply_move(&self.position, &candidate) {
            Ok(next) => {
                let mv = self.as_played(candidate);
                self.commit(mv, next);
                Ok(mv)
            }
            Err(err) => {
                debug!(%err, "move refused, reselecting");
                self.clear_selection();
                self.select_origin(dest);
                Err(err.into())
            }
        }
    }

    /// Drop the default queen from moves that do not promote, so the move
    /// reads the way it was played.
    fn as_played(&self, mut mv: Move) -> Move {
        let is_pawn = self
            .rules
            .piece_at(&self.position, mv.from)
            .map(|p| p.piece_type == PieceType::Pawn)
            .unwrap_or(false);
        if !is_pawn || !(mv.to.row == 0 || mv.to.row == 7) {
            mv.promotion = None;
        }
        mv
    }

    /// Play a random legal move for the computer.
    ///
    /// Does nothing when the game is over or it is not the computer's turn.
    /// If no move can be played the session restarts and shows
    /// [`RESET_NOTICE`].
    pub fn computer_move(&mut self) -> ComputerTurn {
        if self.status.is_terminal() || !self.is_computer_turn() {
            return ComputerTurn::Skipped;
        }
        self.timer.cancel();
        match pick_move(&self.rules, &self.position, &mut self.rng) {
            Ok(result) => {
                if result.rejected > 0 {
                    warn!(rejected = result.rejected, "computer move needed fallback");
                }
                self.commit(result.mv, result.position);
                ComputerTurn::Played(result.mv)
            }
            Err(err) => {
                warn!(%err, "computer could not move, resetting the game");
                self.restart();
                self.notice = Some(RESET_NOTICE.to_string());
                ComputerTurn::Reset
            }
        }
    }

    /// Timer callback for a ticket from [`GameSession::pending_computer_move`].
    pub fn fire_computer_move(&mut self, token: u32) -> ComputerTurn {
        if !self.timer.fire(token) {
            debug!(token, "stale computer move ticket");
            return ComputerTurn::Skipped;
        }
        self.computer_move()
    }

    /// Start over from the initial position.
    pub fn reset(&mut self) {
        info!("game reset");
        self.restart();
        self.notice = None;
    }

    fn restart(&mut self) {
        self.timer.cancel();
        self.position = self.rules.initial_position();
        self.clear_selection();
        self.annotations.clear();
        self.status = GameStatus::InProgress;
        self.schedule_if_computer_turn();
    }

    fn clear_selection(&mut self) {
        self.selection = None;
        self.destinations.clear();
    }

    fn commit(&mut self, mv: Move, next: R::Position) {
        self.timer.cancel();
        self.position = next;
        self.clear_selection();
        self.notice = None;
        self.status = GameStatus::classify(&self.rules, &self.position);
        info!(%mv, "move played");

        match self.status.message() {
            Some(message) => info!(%message, "game over"),
            None => self.schedule_if_computer_turn(),
        }
    }

    fn schedule_if_computer_turn(&mut self) {
        if self.is_computer_turn() {
            let ticket = self.timer.schedule(self.config.think_delay_ms);
            debug!(token = ticket.token, delay_ms = ticket.delay_ms, "computer move scheduled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::piece::Piece;
    use crate::rules::testing::{Mute, Staged, Unreliable};

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn seeded() -> SessionConfig {
        SessionConfig { seed: Some(17), ..SessionConfig::new() }
    }

    fn click_move<R: RulesEngine>(session: &mut GameSession<R>, from: &str, to: &str) -> Option<Move> {
        assert_eq!(session.on_square_click(sq(from)), None);
        session.on_square_click(sq(to))
    }

    #[test]
    fn e2_e4_hands_the_turn_to_the_computer() {
        let mut session = GameSession::new(seeded());
        let played = click_move(&mut session, "e2", "e4");

        assert_eq!(played, Some(Move::from_uci("e2e4").unwrap()));
        assert_eq!(
            session.position().piece_at(sq("e4")),
            Some(Piece::new(PieceType::Pawn, Color::White))
        );
        assert_eq!(session.turn(), Color::Black);
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.selection(), None);
        let ticket = session.pending_computer_move().expect("computer reply scheduled");
        assert_eq!(ticket.delay_ms, 300);

        match session.fire_computer_move(ticket.token) {
            ComputerTurn::Played(mv) => assert_eq!(session.position().piece_at(mv.to).map(|p| p.color), Some(Color::Black)),
            other => panic!("expected a computer move, got {other:?}"),
        }
        assert_eq!(session.turn(), Color::White);
        assert_eq!(session.pending_computer_move(), None);
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn selecting_shows_legal_destinations() {
        let mut session = GameSession::new(seeded());
        assert!(session.select_origin(sq("e2")));
        assert_eq!(session.selection(), Some(sq("e2")));
        assert_eq!(session.destinations(), &[sq("e3"), sq("e4")]);
        assert!(!session.select_origin(sq("d2")), "an origin is already selected");
    }

    #[test]
    fn clicking_an_empty_square_changes_nothing() {
        let mut session = GameSession::new(seeded());
        let before = serde_json::to_value(session.view()).unwrap();
        assert_eq!(session.on_square_click(sq("e4")), None);
        assert_eq!(session.selection(), None);
        assert!(session.view().highlights.is_empty());
        assert_eq!(serde_json::to_value(session.view()).unwrap(), before);
    }

    #[test]
    fn opponent_pieces_cannot_be_selected() {
        let mut session = GameSession::new(seeded());
        session.on_square_click(sq("e7"));
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn an_illegal_second_click_starts_over_from_that_square() {
        let mut session = GameSession::new(seeded());
        assert_eq!(click_move(&mut session, "e2", "d2"), None);
        assert_eq!(session.selection(), Some(sq("d2")));
        assert_eq!(session.destinations(), &[sq("d3"), sq("d4")]);

        assert!(matches!(session.attempt_move(sq("d2"), sq("d5")), Err(MoveError::Illegal(_))));
        assert_eq!(session.selection(), None);
        assert!(session.destinations().is_empty());
        assert_eq!(session.turn(), Color::White);
    }

    #[test]
    fn right_clicks_do_not_disturb_the_selection() {
        let mut session = GameSession::new(seeded());
        session.on_square_click(sq("g1"));
        session.on_square_right_click(sq("a5"));

        assert_eq!(session.selection(), Some(sq("g1")));
        assert_eq!(session.destinations(), &[sq("f3"), sq("h3")]);
        assert!(session.annotations().contains(&sq("a5")));

        session.on_square_right_click(sq("a5"));
        assert!(session.annotations().is_empty());
        assert_eq!(session.selection(), Some(sq("g1")));

        session.on_square_right_click(sq("c6"));
        assert!(session.on_square_click(sq("f3")).is_some());
        assert!(session.annotations().contains(&sq("c6")), "moves keep annotations");
    }

    /// 1.f3 e5 2.g4 Qh4#. Black's moves are entered by hand while the
    /// computer's reply is pending, which must cancel that reply.
    #[test]
    fn fools_mate_ends_the_game() {
        let mut session = GameSession::new(seeded());

        click_move(&mut session, "f2", "f3").unwrap();
        let stale = session.pending_computer_move().unwrap();
        click_move(&mut session, "e7", "e5").unwrap();
        assert_eq!(session.pending_computer_move(), None);
        assert_eq!(session.fire_computer_move(stale.token), ComputerTurn::Skipped);
        assert_eq!(session.turn(), Color::White);

        click_move(&mut session, "g2", "g4").unwrap();
        click_move(&mut session, "d8", "h4").unwrap();

        assert_eq!(session.status(), GameStatus::Checkmate { winner: Color::Black });
        assert_eq!(session.pending_computer_move(), None);
        assert_eq!(session.view().message.as_deref(), Some("Black wins by checkmate!"));

        let fen = session.view().fen;
        assert_eq!(session.on_square_click(sq("a2")), None);
        assert_eq!(session.selection(), None);
        assert_eq!(session.attempt_move(sq("a2"), sq("a3")), Err(MoveError::GameOver));
        assert_eq!(session.computer_move(), ComputerTurn::Skipped);
        assert_eq!(session.view().fen, fen);
    }

    #[test]
    fn computer_waits_for_its_turn() {
        let mut session = GameSession::new(seeded());
        assert_eq!(session.computer_move(), ComputerTurn::Skipped);
        assert_eq!(session.turn(), Color::White);
    }

    #[test]
    fn reset_is_idempotent_and_cancels_the_reply() {
        let mut session = GameSession::new(seeded());
        session.on_square_right_click(sq("h5"));
        click_move(&mut session, "e2", "e4").unwrap();
        let ticket = session.pending_computer_move().unwrap();

        session.reset();
        let once = serde_json::to_value(session.view()).unwrap();
        session.reset();
        let twice = serde_json::to_value(session.view()).unwrap();
        assert_eq!(once, twice);

        assert_eq!(session.fire_computer_move(ticket.token), ComputerTurn::Skipped);
        assert_eq!(session.view().fen, Board::new().to_fen());
        assert!(session.annotations().is_empty());
        assert_eq!(session.status(), GameStatus::InProgress);
    }

    #[test]
    fn computer_opens_when_playing_white() {
        let config = SessionConfig { computer_side: Some(Color::White), ..seeded() };
        let mut session = GameSession::new(config);
        let ticket = session.pending_computer_move().expect("white's first move scheduled");
        assert!(matches!(session.fire_computer_move(ticket.token), ComputerTurn::Played(_)));
        assert_eq!(session.turn(), Color::Black);
    }

    #[test]
    fn two_humans_never_schedule() {
        let config = SessionConfig { computer_side: None, ..seeded() };
        let mut session = GameSession::new(config);
        click_move(&mut session, "e2", "e4").unwrap();
        assert_eq!(session.pending_computer_move(), None);
        assert_eq!(session.computer_move(), ComputerTurn::Skipped);
    }

    #[test]
    fn computer_falls_back_past_refused_moves() {
        let rules = Unreliable::new(|mv| mv.from.row == 6);
        let mut session = GameSession::with_rules(rules, seeded());
        click_move(&mut session, "e2", "e4").unwrap();
        let ticket = session.pending_computer_move().unwrap();
        match session.fire_computer_move(ticket.token) {
            ComputerTurn::Played(mv) => assert_eq!(mv.from.row, 7, "only knight moves are accepted"),
            other => panic!("expected a computer move, got {other:?}"),
        }
    }

    #[test]
    fn computer_without_moves_resets_with_a_notice() {
        let mut session = GameSession::with_rules(Mute, seeded());
        click_move(&mut session, "e2", "e4").unwrap();
        let ticket = session.pending_computer_move().unwrap();

        assert_eq!(session.fire_computer_move(ticket.token), ComputerTurn::Reset);
        assert_eq!(session.notice(), Some(RESET_NOTICE));
        assert_eq!(session.view().notice.as_deref(), Some(RESET_NOTICE));
        assert_eq!(session.view().fen, Board::new().to_fen());
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.pending_computer_move(), None);

        click_move(&mut session, "d2", "d4").unwrap();
        assert_eq!(session.notice(), None, "the next move clears the notice");

        session.reset();
        assert_eq!(session.notice(), None);
    }

    #[test]
    fn promotion_by_click_makes_a_queen() {
        let rules = Staged("8/P7/8/8/8/8/k7/4K3 w - - 0 1");
        let mut session = GameSession::with_rules(rules, seeded());
        let mv = click_move(&mut session, "a7", "a8").unwrap();
        assert_eq!(mv.promotion, Some(PieceType::Queen));
        assert_eq!(
            session.position().piece_at(sq("a8")),
            Some(Piece::new(PieceType::Queen, Color::White))
        );
    }

    #[test]
    fn stalemate_stops_the_game() {
        let rules = Staged("7k/8/6K1/8/8/8/8/5Q2 w - - 0 1");
        let mut session = GameSession::with_rules(rules, seeded());
        let mv = click_move(&mut session, "f1", "f7").unwrap();
        assert_eq!(mv.promotion, None);
        assert_eq!(session.status(), GameStatus::Stalemate);
        assert_eq!(session.pending_computer_move(), None);
        assert!(session.view().game_over);
        assert_eq!(session.computer_move(), ComputerTurn::Skipped);
    }

    #[test]
    fn capturing_the_last_piece_draws_without_a_reply() {
        let rules = Staged("4k3/8/8/8/8/8/3r4/4K3 w - - 0 1");
        let mut session = GameSession::with_rules(rules, seeded());
        let mv = session.attempt_move(sq("e1"), sq("d2")).unwrap();
        assert_eq!(mv, Move::from_uci("e1d2").unwrap());

        assert_eq!(session.status(), GameStatus::Draw);
        assert!(session.is_computer_turn());
        assert_eq!(session.pending_computer_move(), None);
        assert_eq!(session.view().message.as_deref(), Some("Game ended in a draw!"));
        assert!(matches!(session.attempt_move(sq("d2"), sq("d3")), Err(MoveError::GameOver)));
    }

    #[test]
    fn repeated_position_after_a_pawn_push_draws() {
        let config = SessionConfig { computer_side: None, ..seeded() };
        let mut session = GameSession::new(config);
        let line = ["e2e4", "b8c6", "g1f3", "c6b8", "f3g1", "b8c6", "g1f3", "c6b8", "f3g1"];
        for uci in line {
            assert_eq!(session.status(), GameStatus::InProgress, "game ended before {uci}");
            let mv = Move::from_uci(uci).unwrap();
            session.attempt_move(mv.from, mv.to).unwrap();
        }

        assert_eq!(session.status(), GameStatus::Draw);
        assert_eq!(session.pending_computer_move(), None);
        assert_eq!(session.view().message.as_deref(), Some("Game ended in a draw!"));
    }
}
