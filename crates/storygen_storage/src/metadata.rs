//! Media metadata types.

use crate::MediaType;

/// Metadata about media being stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMetadata {
    /// Type of media (image, audio, video)
    pub media_type: MediaType,
    /// MIME type (e.g., "image/png")
    pub mime_type: String,
    /// Requested object name; bucket backends use it as the object key
    pub filename: Option<String>,
    /// Image width in pixels
    pub width: Option<u32>,
    /// Image height in pixels
    pub height: Option<u32>,
}

impl MediaMetadata {
    /// Metadata for a PNG image, optionally with a target object name.
    pub fn png(filename: Option<String>) -> Self {
        Self {
            media_type: MediaType::Image,
            mime_type: "image/png".to_string(),
            filename,
            width: None,
            height: None,
        }
    }

    /// File extension derived from the MIME type.
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/wav" => "wav",
            "video/mp4" => "mp4",
            other => other.rsplit('/').next().unwrap_or("bin"),
        }
    }
}
