//! Input content types.

use serde::{Deserialize, Serialize};

/// Content carried by a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Input {
    /// Plain text.
    Text(String),
}

impl Input {
    /// The input text.
    pub fn text(&self) -> &str {
        match self {
            Input::Text(text) => text,
        }
    }
}
