//! Trait definitions for storygen model backends.
//!
//! The story pipeline talks to hosted models only through these traits, so
//! tests and alternative providers can be swapped in behind `Arc<dyn _>`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ImageGenerator, Metadata, StorygenDriver};
pub use types::ModelMetadata;
