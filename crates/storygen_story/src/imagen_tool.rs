//! Image tool: prompt in, stored illustrations (or inline bytes) out.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use storygen_core::{AspectRatio, GeneratedImage, ImageRequest};
use storygen_error::{StorageError, StorageErrorKind, StorygenResult};
use storygen_interface::ImageGenerator;
use storygen_rate_limit::ImagenSettings;
use storygen_storage::{MediaMetadata, MediaStorage, blob_name};
use tracing::{error, info, instrument, warn};

use crate::full_prompt;

/// Error returned for a blank prompt.
pub const EMPTY_PROMPT_ERROR: &str = "Prompt is required for image generation";

/// Content the image model is asked to avoid unless told otherwise.
pub const DEFAULT_NEGATIVE_PROMPT: &str =
    "photorealistic, realistic, blurry, low quality, watermark, text overlay";

/// Generation parameters used when a call leaves them unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDefaults {
    /// Content to avoid
    pub negative_prompt: String,
    /// Output aspect ratio
    pub aspect_ratio: AspectRatio,
    /// Images per prompt
    pub number_of_images: u32,
}

impl Default for ImageDefaults {
    fn default() -> Self {
        Self {
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            aspect_ratio: AspectRatio::Wide,
            number_of_images: 1,
        }
    }
}

impl ImageDefaults {
    /// Defaults from the `[imagen]` section.
    ///
    /// An unrecognised aspect ratio label falls back to 16:9.
    pub fn from_settings(settings: &ImagenSettings) -> Self {
        let aspect_ratio = settings.aspect_ratio.parse().unwrap_or_else(|_| {
            warn!(
                aspect_ratio = %settings.aspect_ratio,
                "Unknown aspect ratio in configuration, using 16:9"
            );
            AspectRatio::Wide
        });

        Self {
            negative_prompt: settings.negative_prompt.clone(),
            aspect_ratio,
            number_of_images: settings.number_of_images.max(1),
        }
    }
}

/// Per-call overrides of [`ImageDefaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOptions {
    /// Content to avoid
    pub negative_prompt: Option<String>,
    /// Output aspect ratio
    pub aspect_ratio: Option<AspectRatio>,
    /// Images per prompt
    pub number_of_images: Option<u32>,
}

/// Outcome for one generated image.
///
/// Serializes to one of three shapes:
/// `{index, gcs_url, format, stored_in_bucket: true}`,
/// `{index, base64, format, stored_in_bucket: false[, bucket_error]}`, or
/// `{index, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ImageEntry {
    /// Position among the images of one call
    index: usize,
    /// Public URL of the stored image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gcs_url: Option<String>,
    /// Inline image bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base64: Option<String>,
    /// Image format, e.g. `png`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    /// Whether the image is served from storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stored_in_bucket: Option<bool>,
    /// Why the upload failed, when falling back to inline bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bucket_error: Option<String>,
    /// Why the image could not be processed at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ImageEntry {
    /// Image stored and reachable at `url`.
    pub fn stored(index: usize, url: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            index,
            gcs_url: Some(url.into()),
            base64: None,
            format: Some(format.into()),
            stored_in_bucket: Some(true),
            bucket_error: None,
            error: None,
        }
    }

    /// Image returned inline, optionally after a failed upload.
    pub fn inline(
        index: usize,
        base64: impl Into<String>,
        format: impl Into<String>,
        bucket_error: Option<String>,
    ) -> Self {
        Self {
            index,
            gcs_url: None,
            base64: Some(base64.into()),
            format: Some(format.into()),
            stored_in_bucket: Some(false),
            bucket_error,
            error: None,
        }
    }

    /// Image that could not be processed.
    pub fn failed(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            gcs_url: None,
            base64: None,
            format: None,
            stored_in_bucket: None,
            bucket_error: None,
            error: Some(error.into()),
        }
    }

    /// True when the image was stored in the bucket.
    pub fn is_stored(&self) -> bool {
        self.stored_in_bucket.unwrap_or(false)
    }
}

/// Result of one [`ImagenTool::run`] call, in its JSON wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageToolResult {
    /// Images were generated (individual entries may still carry errors)
    Completed {
        /// Always `true`
        success: bool,
        /// Number of entries in `images`
        images_generated: usize,
        /// Entries stored in the bucket
        images_in_bucket: usize,
        /// Bucket name when storage is configured
        bucket_name: Option<String>,
        /// True when at least one image is served by URL
        token_safe: bool,
        /// One entry per image
        images: Vec<ImageEntry>,
    },
    /// The image model call failed
    Failed {
        /// Always `false`
        success: bool,
        /// `Image generation failed: ...`
        error: String,
    },
    /// The call was refused before reaching the model
    Rejected {
        /// Reason for refusal
        error: String,
    },
}

impl ImageToolResult {
    fn completed(images: Vec<ImageEntry>, bucket_name: Option<String>) -> Self {
        let images_in_bucket = images.iter().filter(|entry| entry.is_stored()).count();
        Self::Completed {
            success: true,
            images_generated: images.len(),
            images_in_bucket,
            bucket_name,
            token_safe: images_in_bucket > 0,
            images,
        }
    }

    fn failed(error: impl std::fmt::Display) -> Self {
        Self::Failed {
            success: false,
            error: format!("Image generation failed: {}", error),
        }
    }

    /// Images of a completed call, empty otherwise.
    pub fn images(&self) -> &[ImageEntry] {
        match self {
            Self::Completed { images, .. } => images,
            _ => &[],
        }
    }

    /// Error message of a failed or rejected call.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Completed { .. } => None,
            Self::Failed { error, .. } | Self::Rejected { error } => Some(error),
        }
    }

    /// Serialize to the JSON stored in session state.
    pub fn to_json(&self) -> String {
        // Every field is a string, number, bool, or list of those
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success": false, "error": "Image generation failed: {}"}}"#, e)
        })
    }

    /// Parse JSON written by [`ImageToolResult::to_json`].
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Generates illustrations and stores them for display.
///
/// Images are uploaded to the configured storage and returned by URL. When
/// no storage is configured, or an upload fails, the bytes are returned
/// inline as base64 instead.
pub struct ImagenTool {
    generator: Arc<dyn ImageGenerator>,
    storage: Option<Arc<dyn MediaStorage>>,
    bucket_name: Option<String>,
    defaults: ImageDefaults,
}

impl std::fmt::Debug for ImagenTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagenTool")
            .field("generator", &self.generator.model_name())
            .field(
                "storage",
                &self.storage.as_ref().map(|storage| storage.backend_name()),
            )
            .field("bucket_name", &self.bucket_name)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl ImagenTool {
    /// Tool that returns every image inline.
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            generator,
            storage: None,
            bucket_name: None,
            defaults: ImageDefaults::default(),
        }
    }

    /// Upload images to `storage`, reporting `bucket_name` in results.
    pub fn with_storage(
        mut self,
        storage: Arc<dyn MediaStorage>,
        bucket_name: Option<String>,
    ) -> Self {
        self.storage = Some(storage);
        self.bucket_name = bucket_name;
        self
    }

    /// Replace the generation defaults.
    pub fn with_defaults(mut self, defaults: ImageDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Generation defaults in use.
    pub fn defaults(&self) -> &ImageDefaults {
        &self.defaults
    }

    /// Generate images for `prompt`.
    ///
    /// Never fails: every problem is reported inside the returned result.
    #[instrument(skip(self, prompt, options), fields(prompt_len = prompt.len()))]
    pub async fn run(&self, prompt: &str, options: &ImageOptions) -> ImageToolResult {
        if prompt.trim().is_empty() {
            return ImageToolResult::Rejected {
                error: EMPTY_PROMPT_ERROR.to_string(),
            };
        }

        let full = full_prompt(prompt);
        info!(prompt = %full, "Generating image");

        let request = match self.request(&full, options) {
            Ok(request) => request,
            Err(e) => return ImageToolResult::failed(e),
        };

        let images = match self.generator.generate_images(&request).await {
            Ok(images) => images,
            Err(e) => {
                error!(error = %e, "Image model call failed");
                return ImageToolResult::failed(e);
            }
        };

        let mut entries = Vec::with_capacity(images.len());
        for (index, image) in images.into_iter().enumerate() {
            entries.push(self.process(&full, index, image).await);
        }

        let bucket_name = self.storage.as_ref().and(self.bucket_name.clone());
        ImageToolResult::completed(entries, bucket_name)
    }

    fn request(&self, prompt: &str, options: &ImageOptions) -> StorygenResult<ImageRequest> {
        let negative_prompt = options
            .negative_prompt
            .clone()
            .unwrap_or_else(|| self.defaults.negative_prompt.clone());

        ImageRequest::builder()
            .prompt(prompt)
            .negative_prompt(Some(negative_prompt).filter(|p| !p.trim().is_empty()))
            .aspect_ratio(options.aspect_ratio.unwrap_or(self.defaults.aspect_ratio))
            .number_of_images(
                options
                    .number_of_images
                    .unwrap_or(self.defaults.number_of_images),
            )
            .build()
            .map_err(|e| storygen_error::BuilderError::from(e.to_string()).into())
    }

    async fn process(&self, prompt: &str, index: usize, image: GeneratedImage) -> ImageEntry {
        if image.data().is_empty() {
            return ImageEntry::failed(
                index,
                "Failed to process image: model returned no image data",
            );
        }

        let format = image.format().to_string();
        let Some(storage) = &self.storage else {
            return ImageEntry::inline(index, STANDARD.encode(image.data()), format, None);
        };

        match self.upload(storage.as_ref(), prompt, index, &image).await {
            Ok(url) => {
                info!(index, url = %url, "Image uploaded");
                ImageEntry::stored(index, url, format)
            }
            Err(e) => {
                error!(index, error = %e, "Image upload failed, returning inline data");
                ImageEntry::inline(
                    index,
                    STANDARD.encode(image.data()),
                    format,
                    Some(e.to_string()),
                )
            }
        }
    }

    async fn upload(
        &self,
        storage: &dyn MediaStorage,
        prompt: &str,
        index: usize,
        image: &GeneratedImage,
    ) -> StorygenResult<String> {
        let mut metadata = MediaMetadata::png(Some(blob_name(prompt, index, Utc::now())));
        metadata.mime_type = image.mime_type().clone();

        let reference = storage.store(image.data(), &metadata).await?;
        storage.get_url(&reference).await?.ok_or_else(|| {
            StorageError::new(StorageErrorKind::NoPublicUrl(reference.storage_path.clone())).into()
        })
    }
}
