use serde::{Deserialize, Serialize};

use crate::piece::Color;

/// Settings for one game session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Side played by the computer. `None` leaves both sides to humans.
    pub computer_side: Option<Color>,
    /// Pause before the computer replies, in milliseconds.
    pub think_delay_ms: u32,
    /// Seed for the computer's move choice. Ignored in the browser build.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        SessionConfig {
            computer_side: Some(Color::Black),
            think_delay_ms: 300,
            seed: None,
        }
    }

    /// Parse a JSON object; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
