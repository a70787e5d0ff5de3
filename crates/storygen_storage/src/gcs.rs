//! Google Cloud Storage bucket backend.

use crate::{MediaMetadata, MediaReference, MediaStorage};
use reqwest::{Client, StatusCode, Url};
use sha2::{Digest, Sha256};
use storygen_error::{StorageError, StorageErrorKind, StorygenResult};
use uuid::Uuid;

/// Host serving publicly readable objects.
pub const PUBLIC_STORAGE_HOST: &str = "https://storage.googleapis.com";

/// Cloud Storage backend using the JSON API.
///
/// Objects are uploaded with a simple media upload. When `public_read` is
/// set, the `publicRead` ACL is requested and [`MediaStorage::get_url`]
/// returns `{public_host}/{bucket}/{object}`. The public host stays
/// [`PUBLIC_STORAGE_HOST`] when the API endpoint is redirected.
///
/// # Example
///
/// ```no_run
/// use storygen_storage::{GcsStorage, MediaMetadata, MediaStorage};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = GcsStorage::new("story-images", Some("ya29.token".to_string()));
/// let reference = storage
///     .store(&[0x89, 0x50, 0x4e, 0x47], &MediaMetadata::png(None))
///     .await?;
/// println!("{:?}", storage.get_url(&reference).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GcsStorage {
    client: Client,
    bucket: String,
    access_token: Option<String>,
    endpoint: String,
    public_host: String,
    public_read: bool,
}

impl GcsStorage {
    /// Create a backend for `bucket`, authenticating with a bearer token.
    pub fn new(bucket: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            bucket: bucket.into(),
            access_token,
            endpoint: PUBLIC_STORAGE_HOST.to_string(),
            public_host: PUBLIC_STORAGE_HOST.to_string(),
            public_read: true,
        }
    }

    /// Point the backend at another API host (emulators, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Host that serves public objects (CDN, emulator).
    pub fn with_public_host(mut self, host: impl Into<String>) -> Self {
        self.public_host = host.into().trim_end_matches('/').to_string();
        self
    }

    /// Toggle the `publicRead` ACL on upload.
    pub fn with_public_read(mut self, public_read: bool) -> Self {
        self.public_read = public_read;
        self
    }

    /// Bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn upload_failed(&self, message: impl Into<String>) -> StorageError {
        StorageError::new(StorageErrorKind::Upload {
            bucket: self.bucket.clone(),
            message: message.into(),
        })
    }

    fn download_failed(&self, message: impl Into<String>) -> StorageError {
        StorageError::new(StorageErrorKind::Download {
            bucket: self.bucket.clone(),
            message: message.into(),
        })
    }

    /// `{endpoint}/{prefix...}/b/{bucket}/o[/{object}]` with every segment escaped.
    fn object_url(&self, prefix: &[&str], object: Option<&str>) -> StorygenResult<Url> {
        let mut segments: Vec<&str> = prefix.to_vec();
        segments.extend(["b", self.bucket.as_str(), "o"]);
        segments.extend(object);
        join_segments(&self.endpoint, &segments)
    }

    /// `{public_host}/{bucket}/{object path}`, escaping each path segment.
    fn public_url(&self, object: &str) -> StorygenResult<Url> {
        let mut segments = vec![self.bucket.as_str()];
        segments.extend(object.split('/'));
        join_segments(&self.public_host, &segments)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn join_segments(base: &str, segments: &[&str]) -> StorygenResult<Url> {
    let mut url = Url::parse(base).map_err(|e| {
        StorageError::new(StorageErrorKind::InvalidConfig(format!(
            "invalid endpoint {}: {}",
            base, e
        )))
    })?;
    url.path_segments_mut()
        .map_err(|_| {
            StorageError::new(StorageErrorKind::InvalidConfig(format!(
                "endpoint cannot be a base URL: {}",
                base
            )))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait::async_trait]
impl MediaStorage for GcsStorage {
    #[tracing::instrument(skip(self, data, metadata), fields(bucket = %self.bucket, size = data.len()))]
    async fn store(&self, data: &[u8], metadata: &MediaMetadata) -> StorygenResult<MediaReference> {
        let hash = format!("{:x}", Sha256::digest(data));
        let name = metadata.filename.clone().unwrap_or_else(|| {
            format!(
                "{}/{}.{}",
                metadata.media_type.directory(),
                hash,
                metadata.extension()
            )
        });

        let url = self.object_url(&["upload", "storage", "v1"], None)?;
        let mut query = vec![("uploadType", "media"), ("name", name.as_str())];
        if self.public_read {
            query.push(("predefinedAcl", "publicRead"));
        }

        let response = self
            .authorized(self.client.post(url))
            .query(&query)
            .header(reqwest::header::CONTENT_TYPE, metadata.mime_type.as_str())
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| self.upload_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, object = %name, "Bucket upload rejected");
            return Err(self.upload_failed(format!("HTTP {}: {}", status.as_u16(), body)).into());
        }

        tracing::info!(object = %name, "Uploaded media to bucket");

        Ok(MediaReference {
            id: Uuid::new_v4(),
            content_hash: hash,
            storage_backend: self.backend_name().to_string(),
            storage_path: name,
            size_bytes: data.len() as u64,
            media_type: metadata.media_type,
            mime_type: metadata.mime_type.clone(),
        })
    }

    #[tracing::instrument(skip(self, reference), fields(bucket = %self.bucket, object = %reference.storage_path))]
    async fn retrieve(&self, reference: &MediaReference) -> StorygenResult<Vec<u8>> {
        let url = self.object_url(&["storage", "v1"], Some(&reference.storage_path))?;

        let response = self
            .authorized(self.client.get(url))
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| self.download_failed(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::new(StorageErrorKind::NotFound(
                reference.storage_path.clone(),
            ))
            .into()),
            status if !status.is_success() => {
                Err(self.download_failed(format!("HTTP {}", status.as_u16())).into())
            }
            _ => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| self.download_failed(e.to_string()))?;
                Ok(bytes.to_vec())
            }
        }
    }

    async fn get_url(&self, reference: &MediaReference) -> StorygenResult<Option<String>> {
        if !self.public_read {
            return Ok(None);
        }
        Ok(Some(self.public_url(&reference.storage_path)?.to_string()))
    }

    #[tracing::instrument(skip(self, reference), fields(bucket = %self.bucket, object = %reference.storage_path))]
    async fn delete(&self, reference: &MediaReference) -> StorygenResult<()> {
        let url = self.object_url(&["storage", "v1"], Some(&reference.storage_path))?;

        let response = self
            .authorized(self.client.delete(url))
            .send()
            .await
            .map_err(|e| self.upload_failed(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::new(StorageErrorKind::NotFound(
                reference.storage_path.clone(),
            ))
            .into()),
            status if !status.is_success() => {
                Err(self.upload_failed(format!("delete: HTTP {}", status.as_u16())).into())
            }
            _ => Ok(()),
        }
    }

    async fn exists(&self, reference: &MediaReference) -> StorygenResult<bool> {
        let url = self.object_url(&["storage", "v1"], Some(&reference.storage_path))?;

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| self.download_failed(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(self.download_failed(format!("HTTP {}", status.as_u16())).into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "gcs"
    }
}
