//! Output types from model responses.

use serde::{Deserialize, Serialize};

/// A piece of model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Output {
    /// Plain text output.
    Text(String),
}

impl Output {
    /// The output text.
    pub fn text(&self) -> &str {
        match self {
            Output::Text(text) => text,
        }
    }
}
