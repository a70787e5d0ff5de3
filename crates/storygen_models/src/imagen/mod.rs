//! Vertex AI Imagen client.

mod client;
mod dto;

pub use client::ImagenClient;

use storygen_error::ImagenError;

/// Result type for Imagen-specific operations.
pub type ImagenResult<T> = Result<T, ImagenError>;
