//! Error types for storygen.
//!
//! This crate provides the foundation error types used throughout the storygen workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use storygen_error::{StorygenResult, ConfigError};
//!
//! fn fetch_data() -> StorygenResult<String> {
//!     Err(ConfigError::new("GEMINI_API_KEY is not set"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod builder;
mod config;
mod error;
mod gemini;
mod imagen;
mod json;
mod server;
mod storage;
mod story;

pub use backend::BackendError;
pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{StorygenError, StorygenErrorKind, StorygenResult};
pub use gemini::{GeminiError, GeminiErrorKind, RetryableError};
pub use imagen::{ImagenError, ImagenErrorKind};
pub use json::JsonError;
pub use server::{ServerError, ServerErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use story::{StoryError, StoryErrorKind};
