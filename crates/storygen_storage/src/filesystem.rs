//! Filesystem-based media storage implementation.

use crate::{MediaMetadata, MediaReference, MediaStorage, MediaType};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use storygen_error::{StorageError, StorageErrorKind, StorygenResult};
use uuid::Uuid;

/// Filesystem storage backend.
///
/// Stores media in a content-addressable layout:
/// `{base_path}/{images|audio|video}/{hash[0:2]}/{hash[2:4]}/{hash}.{ext}`
///
/// Identical content lands on the same path, so storing twice is free.
/// Writes go through a temp file and a rename. When a public base URL is
/// configured (e.g. the server's `/media` route), [`MediaStorage::get_url`]
/// maps stored paths onto it; otherwise no URL is available.
pub struct FileSystemStorage {
    base_path: PathBuf,
    public_base_url: Option<String>,
}

impl FileSystemStorage {
    /// Create a new filesystem storage backend.
    ///
    /// Creates the base directory if it doesn't exist.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> StorygenResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Created filesystem storage");
        Ok(Self {
            base_path,
            public_base_url: None,
        })
    }

    /// Serve stored files under this URL prefix.
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    fn relative_path(hash: &str, media_type: MediaType, extension: &str) -> PathBuf {
        PathBuf::from(media_type.directory())
            .join(&hash[0..2])
            .join(&hash[2..4])
            .join(format!("{}.{}", hash, extension))
    }

    fn verify_hash(data: &[u8], expected_hash: &str) -> StorygenResult<()> {
        let actual_hash = Self::compute_hash(data);
        if actual_hash != expected_hash {
            return Err(StorageError::new(StorageErrorKind::HashMismatch {
                expected: expected_hash.to_string(),
                actual: actual_hash,
            })
            .into());
        }
        Ok(())
    }

    fn reference(
        &self,
        hash: String,
        path: &Path,
        data: &[u8],
        metadata: &MediaMetadata,
    ) -> MediaReference {
        MediaReference {
            id: Uuid::new_v4(),
            content_hash: hash,
            storage_backend: self.backend_name().to_string(),
            storage_path: path.to_string_lossy().to_string(),
            size_bytes: data.len() as u64,
            media_type: metadata.media_type,
            mime_type: metadata.mime_type.clone(),
        }
    }
}

#[async_trait::async_trait]
impl MediaStorage for FileSystemStorage {
    #[tracing::instrument(skip(self, data, metadata), fields(size = data.len(), media_type = %metadata.media_type))]
    async fn store(&self, data: &[u8], metadata: &MediaMetadata) -> StorygenResult<MediaReference> {
        let hash = Self::compute_hash(data);
        let path = self
            .base_path
            .join(Self::relative_path(&hash, metadata.media_type, metadata.extension()));

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(hash = %hash, path = %path.display(), "Media already exists");
            return Ok(self.reference(hash, &path, data, metadata));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::info!(
            hash = %hash,
            path = %path.display(),
            size = data.len(),
            "Stored media file"
        );

        Ok(self.reference(hash, &path, data, metadata))
    }

    #[tracing::instrument(skip(self, reference), fields(hash = %reference.content_hash))]
    async fn retrieve(&self, reference: &MediaReference) -> StorygenResult<Vec<u8>> {
        let path = Path::new(&reference.storage_path);

        let data = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(reference.storage_path.clone()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        Self::verify_hash(&data, &reference.content_hash)?;

        tracing::debug!(size = data.len(), "Retrieved media file");
        Ok(data)
    }

    async fn get_url(&self, reference: &MediaReference) -> StorygenResult<Option<String>> {
        let Some(base_url) = &self.public_base_url else {
            return Ok(None);
        };

        let Ok(relative) = Path::new(&reference.storage_path).strip_prefix(&self.base_path) else {
            return Ok(None);
        };

        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Ok(Some(format!("{}/{}", base_url, relative)))
    }

    #[tracing::instrument(skip(self, reference), fields(hash = %reference.content_hash))]
    async fn delete(&self, reference: &MediaReference) -> StorygenResult<()> {
        let path = Path::new(&reference.storage_path);

        tokio::fs::remove_file(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(reference.storage_path.clone()))
            } else {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "delete {}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::info!(path = %path.display(), "Deleted media file");
        Ok(())
    }

    async fn exists(&self, reference: &MediaReference) -> StorygenResult<bool> {
        Ok(tokio::fs::try_exists(&reference.storage_path)
            .await
            .unwrap_or(false))
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
