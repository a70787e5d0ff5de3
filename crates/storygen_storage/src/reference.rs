//! Media reference types.

use crate::MediaType;
use uuid::Uuid;

/// Reference to stored media.
///
/// Holds everything a backend needs to find the bytes again.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaReference {
    /// Unique identifier for this media reference
    pub id: Uuid,
    /// SHA-256 hash of the content
    pub content_hash: String,
    /// Storage backend name (e.g., "filesystem", "gcs")
    pub storage_backend: String,
    /// Backend-specific path or object key
    pub storage_path: String,
    /// Size of the media in bytes
    pub size_bytes: u64,
    /// Type of media
    pub media_type: MediaType,
    /// MIME type
    pub mime_type: String,
}
