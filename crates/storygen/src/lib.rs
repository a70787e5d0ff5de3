//! storygen - illustrated children's stories from a handful of keywords
//!
//! A story model (Gemini) writes a four-scene story as JSON, an image model
//! (Imagen on Vertex AI) illustrates every scene, and the images are stored
//! in a Cloud Storage bucket so clients receive URLs instead of bytes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use storygen::{StorygenConfig, build_pipeline};
//! use storygen_story::ServerMessage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StorygenConfig::load(None)?;
//!     let pipeline = build_pipeline(&config)?;
//!
//!     let mut messages: Vec<ServerMessage> = Vec::new();
//!     pipeline.run("demo", "owl, lantern, snow", &mut messages).await?;
//!     println!("{} messages", messages.len());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `storygen_error` - Error types
//! - `storygen_core` - Request and response data types
//! - `storygen_interface` - `StorygenDriver` and `ImageGenerator` traits
//! - `storygen_rate_limit` - Rate limiting, retry, and configuration
//! - `storygen_storage` - Cloud Storage and filesystem media backends
//! - `storygen_models` - Gemini and Imagen clients
//! - `storygen_story` - Story model, agents, and the story pipeline
//! - `storygen_server` - HTTP and websocket server
//!
//! This crate (`storygen`) re-exports the public surface and wires the
//! pieces together from configuration.

mod bootstrap;
mod sink;

pub use bootstrap::{build_image_tool, build_pipeline, build_storage, media_dir};
pub use sink::JsonLinesSink;

pub use storygen_core::*;
pub use storygen_error::*;
pub use storygen_interface::*;
pub use storygen_models::{GeminiClient, ImagenClient, TieredGemini};
pub use storygen_rate_limit::*;
pub use storygen_server::{AppState, StoryServer, build_cors_layer, health_check};
pub use storygen_storage::{
    FileSystemStorage, GcsStorage, MediaMetadata, MediaReference, MediaStorage, MediaType,
    blob_name,
};
pub use storygen_story::*;

pub mod telemetry;

// OpenTelemetry observability module
#[cfg(feature = "observability")]
pub mod observability;
