// =============================================================================
// Computer opponent
//
// The computer plays a uniformly random legal move. It asks the rules engine
// for the legal list, draws one, and plays it. If the engine refuses a move it
// listed itself, that candidate is dropped and another is drawn from the rest,
// until one is accepted or the list runs dry.
// =============================================================================

use tracing::warn;

use crate::error::ComputerMoveError;
use crate::moves::Move;
use crate::rules::RulesEngine;

// =============================================================================
// Randomness
// =============================================================================

/// Where the computer's dice rolls come from.
///
/// The browser build uses `Math.random()`; native builds use the `rand` crate
/// and can be seeded for reproducible games.
pub enum RandomSource {
    Platform,
    #[cfg(not(target_arch = "wasm32"))]
    Seeded(rand::rngs::StdRng),
}

impl RandomSource {
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            #[cfg(not(target_arch = "wasm32"))]
            Some(seed) => {
                use rand::SeedableRng;
                RandomSource::Seeded(rand::rngs::StdRng::seed_from_u64(seed))
            }
            #[cfg(target_arch = "wasm32")]
            Some(_) => {
                tracing::debug!("seeded play is not available in the browser build");
                RandomSource::Platform
            }
            None => RandomSource::Platform,
        }
    }

    /// Random number in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        match self {
            RandomSource::Platform => platform_random_f64(),
            #[cfg(not(target_arch = "wasm32"))]
            RandomSource::Seeded(rng) => {
                use rand::Rng;
                rng.gen::<f64>()
            }
        }
    }

    /// Uniform index into a non-empty slice of length `len`.
    pub fn index(&mut self, len: usize) -> usize {
        ((self.next_f64() * len as f64) as usize).min(len.saturating_sub(1))
    }
}

fn platform_random_f64() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Math::random()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use rand::Rng;
        rand::thread_rng().gen::<f64>()
    }
}

// =============================================================================
// Move selection
// =============================================================================

/// The move the computer played and the position it produced.
pub struct PickResult<P> {
    pub mv: Move,
    pub position: P,
    /// Candidates the rules engine refused before `mv` was accepted.
    pub rejected: usize,
}

/// Pick a random legal move for the side to move and apply it.
pub fn pick_move<R: RulesEngine>(
    rules: &R,
    position: &R::Position,
    rng: &mut RandomSource,
) -> Result<PickResult<R::Position>, ComputerMoveError> {
    let mut candidates = rules.legal_moves(position, None);
    if candidates.is_empty() {
        return Err(ComputerMoveError::NoLegalMoves);
    }

    let listed = candidates.len();
    let mut rejected = 0;
    while !candidates.is_empty() {
        let mv = candidates.swap_remove(rng.index(candidates.len()));
        match rules.apply_move(position, &mv) {
            Ok(next) => return Ok(PickResult { mv, position: next, rejected }),
            Err(err) => {
                warn!(%mv, %err, "rules engine refused a move it listed as legal");
                rejected += 1;
            }
        }
    }
    Err(ComputerMoveError::AllRejected { tried: listed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::rules::testing::{Mute, Unreliable};
    use crate::rules::StandardRules;

    #[test]
    fn index_stays_in_range() {
        let mut rng = RandomSource::from_seed(Some(1));
        for len in 1..40 {
            assert!(rng.index(len) < len);
        }
        let mut platform = RandomSource::from_seed(None);
        assert_eq!(platform.index(1), 0);
    }

    #[test]
    fn seeded_sources_repeat() {
        let picks = |seed| {
            let mut rng = RandomSource::from_seed(Some(seed));
            let result = pick_move(&StandardRules, &Board::new(), &mut rng).unwrap();
            result.mv
        };
        assert_eq!(picks(42), picks(42));
    }

    #[test]
    fn picks_a_listed_move() {
        let board = Board::new();
        let mut rng = RandomSource::from_seed(Some(3));
        let result = pick_move(&StandardRules, &board, &mut rng).unwrap();
        assert!(board.generate_legal_moves(board.current_turn).contains(&result.mv));
        assert_eq!(result.rejected, 0);
        assert_eq!(result.position.current_turn, board.current_turn.opposite());
    }

    /// Only knight moves are accepted: pawn candidates get dropped and the
    /// draw continues among what is left.
    #[test]
    fn rejected_candidates_are_resampled_without_replacement() {
        let rules = Unreliable::new(|mv| mv.from.row == 1);
        let mut rng = RandomSource::from_seed(Some(11));
        let result = pick_move(&rules, &Board::new(), &mut rng).unwrap();
        assert_eq!(result.mv.from.row, 0, "only a knight move can be accepted");
        assert_eq!(result.rejected, rules.rejected.get());
        assert!(result.rejected <= 16);
    }

    #[test]
    fn exhausting_the_list_is_an_error() {
        let rules = Unreliable::new(|_| true);
        let mut rng = RandomSource::from_seed(Some(5));
        let err = pick_move(&rules, &Board::new(), &mut rng).err();
        assert_eq!(err, Some(ComputerMoveError::AllRejected { tried: 20 }));
        assert_eq!(rules.rejected.get(), 20, "each candidate is tried exactly once");
    }

    #[test]
    fn empty_list_is_an_error() {
        let black_to_move = Board::new().play(&Move::from_uci("e2e4").unwrap()).unwrap();
        let mut rng = RandomSource::from_seed(Some(5));
        let err = pick_move(&Mute, &black_to_move, &mut rng).err();
        assert_eq!(err, Some(ComputerMoveError::NoLegalMoves));
    }
}
