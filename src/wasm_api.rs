use crate::config::SessionConfig;
use crate::moves::Square;
use crate::session::{ComputerTurn, GameSession};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct TurnResult {
    played: Option<String>,
    reset: bool,
}

/// Maps become plain JS objects keyed by square name.
fn to_js<T: Serialize>(value: &T) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value.serialize(&serializer).unwrap_or(JsValue::NULL)
}

fn parse_square(square: &str) -> Result<Square, JsValue> {
    square.parse().map_err(|e: crate::error::ParseError| JsValue::from_str(&e.to_string()))
}

/// Board view adapter for the browser. Every method returns the fresh view
/// unless noted otherwise.
#[wasm_bindgen]
pub struct ChessGame {
    session: GameSession,
}

#[wasm_bindgen]
impl ChessGame {
    /// `config` may be `undefined` or a partial `SessionConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ChessGame, JsValue> {
        let config: SessionConfig = if config.is_undefined() || config.is_null() {
            SessionConfig::new()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        Ok(ChessGame {
            session: GameSession::new(config),
        })
    }

    pub fn build_timestamp() -> String {
        env!("BUILD_TIMESTAMP").to_string()
    }

    pub fn view(&self) -> JsValue {
        to_js(&self.session.view())
    }

    /// Square name to CSS background for every highlighted square.
    pub fn square_styles(&self) -> JsValue {
        to_js(&self.session.view().square_styles())
    }

    pub fn click(&mut self, square: &str) -> Result<JsValue, JsValue> {
        let square = parse_square(square)?;
        self.session.on_square_click(square);
        Ok(self.view())
    }

    pub fn right_click(&mut self, square: &str) -> Result<JsValue, JsValue> {
        let square = parse_square(square)?;
        self.session.on_square_right_click(square);
        Ok(self.view())
    }

    pub fn reset(&mut self) -> JsValue {
        self.session.reset();
        self.view()
    }

    /// Call after `pending_computer_move.delay_ms` with its token. Returns
    /// `{ played, reset }`; read `view()` afterwards.
    pub fn fire_computer_move(&mut self, token: u32) -> JsValue {
        let result = match self.session.fire_computer_move(token) {
            ComputerTurn::Played(mv) => TurnResult { played: Some(mv.to_uci()), reset: false },
            ComputerTurn::Skipped => TurnResult { played: None, reset: false },
            ComputerTurn::Reset => TurnResult { played: None, reset: true },
        };
        to_js(&result)
    }
}
