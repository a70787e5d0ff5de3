//! Wiring clients, storage, and the pipeline together from configuration.

use std::path::PathBuf;
use std::sync::Arc;

use storygen_error::StorygenResult;
use storygen_models::{GeminiClient, ImagenClient};
use storygen_rate_limit::{StorageBackend, StorageSettings, StorygenConfig};
use storygen_storage::{FileSystemStorage, GcsStorage, MediaStorage};
use storygen_story::{ImageDefaults, ImagenTool, StoryPipeline};
use tracing::{info, instrument, warn};

/// Storage backend selected by `[storage]`, with the bucket name reported
/// in image results.
///
/// Returns `Ok(None)` when images should always be returned inline: the
/// `none` backend, or the `gcs` backend without a bucket.
///
/// # Errors
///
/// Fails when the filesystem root cannot be created.
#[instrument(skip_all, fields(backend = ?settings.backend))]
pub fn build_storage(
    settings: &StorageSettings,
    access_token: Option<String>,
) -> StorygenResult<Option<(Arc<dyn MediaStorage>, Option<String>)>> {
    match settings.backend {
        StorageBackend::Gcs => {
            let Some(bucket) = settings.bucket.clone().filter(|b| !b.trim().is_empty()) else {
                warn!("No storage bucket configured, images will be returned as base64");
                return Ok(None);
            };

            let mut storage =
                GcsStorage::new(bucket.clone(), access_token).with_public_read(settings.public_read);
            if let Some(endpoint) = &settings.endpoint {
                storage = storage.with_endpoint(endpoint);
            }
            info!(bucket = %bucket, "Using Cloud Storage bucket");
            Ok(Some((Arc::new(storage), Some(bucket))))
        }
        StorageBackend::Filesystem => {
            let mut storage = FileSystemStorage::new(&settings.filesystem_path)?;
            match &settings.public_base_url {
                Some(url) => storage = storage.with_public_base_url(url),
                None => warn!(
                    "Filesystem storage has no public_base_url, images will be returned as base64"
                ),
            }
            Ok(Some((Arc::new(storage), None)))
        }
        StorageBackend::None => {
            info!("Storage disabled, images will be returned as base64");
            Ok(None)
        }
    }
}

/// Image tool backed by Imagen and the configured storage.
///
/// # Errors
///
/// Fails when the Imagen project or access token is missing, or the
/// storage backend cannot be initialised.
#[instrument(skip_all)]
pub fn build_image_tool(config: &StorygenConfig) -> StorygenResult<ImagenTool> {
    let generator = ImagenClient::from_config(config)?;
    let mut tool =
        ImagenTool::new(Arc::new(generator)).with_defaults(ImageDefaults::from_settings(&config.imagen));

    if let Some((storage, bucket)) = build_storage(&config.storage, config.imagen.access_token.clone())? {
        tool = tool.with_storage(storage, bucket);
    }

    Ok(tool)
}

/// Story pipeline backed by Gemini, Imagen, and the configured storage.
///
/// # Errors
///
/// Fails when `GEMINI_API_KEY` is unset or the image tool cannot be built.
#[instrument(skip_all, fields(model = %config.story.model))]
pub fn build_pipeline(config: &StorygenConfig) -> StorygenResult<StoryPipeline> {
    let driver = GeminiClient::from_config(config)?;
    let tool = build_image_tool(config)?;

    info!(
        image_model = %config.imagen.model,
        scene_delay_ms = config.story.scene_delay_ms,
        "Story pipeline ready"
    );
    Ok(StoryPipeline::new(Arc::new(driver), Arc::new(tool), &config.story))
}

/// Directory the server should expose at `/media`.
///
/// Only the filesystem backend keeps images locally.
pub fn media_dir(settings: &StorageSettings) -> Option<PathBuf> {
    match settings.backend {
        StorageBackend::Filesystem => Some(PathBuf::from(&settings.filesystem_path)),
        StorageBackend::Gcs | StorageBackend::None => None,
    }
}
