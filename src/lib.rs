pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod fen;
pub mod moves;
pub mod piece;
pub mod rules;
pub mod session;
pub mod status;
pub mod timer;
pub mod view;

#[cfg(target_arch = "wasm32")]
mod wasm_api;

pub use config::SessionConfig;
pub use error::{ComputerMoveError, IllegalMoveError, MoveError, ParseError};
pub use moves::{Move, Square};
pub use piece::{Color, Piece, PieceType};
pub use rules::{RulesEngine, StandardRules};
pub use session::{ComputerTurn, GameSession};
pub use status::GameStatus;
pub use view::BoardView;
