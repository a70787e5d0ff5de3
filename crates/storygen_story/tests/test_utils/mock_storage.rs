//! In-memory storage backends.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use storygen_error::{StorageError, StorageErrorKind, StorygenResult};
use storygen_storage::{MediaMetadata, MediaReference, MediaStorage};
use uuid::Uuid;

/// Keeps objects in a map, optionally serving them under a public URL.
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    public_base_url: Option<String>,
}

#[allow(dead_code)]
impl MemoryStorage {
    /// Storage whose objects are public under `base_url`.
    pub fn public(base_url: impl Into<String>) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            public_base_url: Some(base_url.into()),
        }
    }

    /// Storage that cannot produce URLs.
    pub fn private() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            public_base_url: None,
        }
    }

    pub fn object_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl MediaStorage for MemoryStorage {
    async fn store(&self, data: &[u8], metadata: &MediaMetadata) -> StorygenResult<MediaReference> {
        let name = metadata
            .filename
            .clone()
            .unwrap_or_else(|| format!("{}.{}", Uuid::new_v4(), metadata.extension()));
        self.objects.lock().unwrap().insert(name.clone(), data.to_vec());

        Ok(MediaReference {
            id: Uuid::new_v4(),
            content_hash: String::new(),
            storage_backend: self.backend_name().to_string(),
            storage_path: name,
            size_bytes: data.len() as u64,
            media_type: metadata.media_type,
            mime_type: metadata.mime_type.clone(),
        })
    }

    async fn retrieve(&self, reference: &MediaReference) -> StorygenResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&reference.storage_path)
            .cloned()
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(reference.storage_path.clone())).into())
    }

    async fn get_url(&self, reference: &MediaReference) -> StorygenResult<Option<String>> {
        Ok(self
            .public_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base, reference.storage_path)))
    }

    async fn delete(&self, reference: &MediaReference) -> StorygenResult<()> {
        self.objects.lock().unwrap().remove(&reference.storage_path);
        Ok(())
    }

    async fn exists(&self, reference: &MediaReference) -> StorygenResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(&reference.storage_path))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Rejects every upload.
pub struct FailingStorage;

#[async_trait]
impl MediaStorage for FailingStorage {
    async fn store(&self, _data: &[u8], _metadata: &MediaMetadata) -> StorygenResult<MediaReference> {
        Err(StorageError::new(StorageErrorKind::PermissionDenied(
            "bucket is read-only".to_string(),
        ))
        .into())
    }

    async fn retrieve(&self, reference: &MediaReference) -> StorygenResult<Vec<u8>> {
        Err(StorageError::new(StorageErrorKind::NotFound(reference.storage_path.clone())).into())
    }

    async fn get_url(&self, _reference: &MediaReference) -> StorygenResult<Option<String>> {
        Ok(None)
    }

    async fn delete(&self, _reference: &MediaReference) -> StorygenResult<()> {
        Ok(())
    }

    async fn exists(&self, _reference: &MediaReference) -> StorygenResult<bool> {
        Ok(false)
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
