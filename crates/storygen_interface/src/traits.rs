//! Trait definitions for text and image backends.

use crate::ModelMetadata;
use async_trait::async_trait;
use storygen_core::{GenerateRequest, GenerateResponse, GeneratedImage, ImageRequest};
use storygen_error::StorygenResult;

/// Core trait that every text model backend implements.
#[async_trait]
pub trait StorygenDriver: Send + Sync {
    /// Generate model output given a request.
    async fn generate(&self, req: &GenerateRequest) -> StorygenResult<GenerateResponse>;

    /// Provider name (e.g., "gemini").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "gemini-2.5-flash").
    fn model_name(&self) -> &str;
}

/// Backend that turns a text prompt into images.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate images for the request.
    ///
    /// Returns one entry per image the model produced, which may be fewer
    /// than requested when the model filters content.
    async fn generate_images(&self, req: &ImageRequest) -> StorygenResult<Vec<GeneratedImage>>;

    /// Provider name (e.g., "vertex-imagen").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "imagegeneration@006").
    fn model_name(&self) -> &str;
}

/// Trait for querying model metadata and capabilities.
pub trait Metadata: StorygenDriver {
    /// Get model metadata.
    fn metadata(&self) -> ModelMetadata;
}
