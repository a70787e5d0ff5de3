//! Google Gemini story model client.

mod client;

pub use client::{GeminiClient, TieredGemini};

use storygen_error::GeminiError;

/// Result type for Gemini-specific operations.
pub type GeminiResult<T> = Result<T, GeminiError>;
