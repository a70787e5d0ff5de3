//! Storage trait definition.

use crate::{MediaMetadata, MediaReference};
use storygen_error::StorygenResult;

/// Trait for pluggable media storage backends.
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store media and return a reference.
    async fn store(&self, data: &[u8], metadata: &MediaMetadata)
    -> StorygenResult<MediaReference>;

    /// Retrieve media by reference.
    async fn retrieve(&self, reference: &MediaReference) -> StorygenResult<Vec<u8>>;

    /// Public URL for direct access, if the backend can serve one.
    async fn get_url(&self, reference: &MediaReference) -> StorygenResult<Option<String>>;

    /// Delete media by reference.
    async fn delete(&self, reference: &MediaReference) -> StorygenResult<()>;

    /// Check if media exists.
    async fn exists(&self, reference: &MediaReference) -> StorygenResult<bool>;

    /// Backend name recorded in references.
    fn backend_name(&self) -> &'static str;
}
