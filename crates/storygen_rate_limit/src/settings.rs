//! Application settings sections of `storygen.toml`.

use serde::{Deserialize, Serialize};

/// Story model settings (`[story]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorySettings {
    /// Gemini model used for story generation
    pub model: String,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Maximum output tokens
    pub max_tokens: Option<u32>,
    /// Pause between scene illustrations, in milliseconds
    pub scene_delay_ms: u64,
    /// Retries for transient model errors
    pub max_retries: usize,
}

impl Default for StorySettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: Some(0.9),
            max_tokens: Some(2048),
            scene_delay_ms: 2000,
            max_retries: 3,
        }
    }
}

/// Image model settings (`[imagen]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagenSettings {
    /// Google Cloud project (falls back to `GOOGLE_CLOUD_PROJECT`)
    pub project: Option<String>,
    /// Vertex AI region
    pub location: String,
    /// Imagen model identifier
    pub model: String,
    /// OAuth bearer token (falls back to `GOOGLE_OAUTH_ACCESS_TOKEN`)
    pub access_token: Option<String>,
    /// Override for the Vertex AI base URL
    pub endpoint: Option<String>,
    /// Content the model should avoid
    pub negative_prompt: String,
    /// Aspect ratio label, e.g. `16:9`
    pub aspect_ratio: String,
    /// Images requested per prompt
    pub number_of_images: u32,
    /// Retries for transient model errors
    pub max_retries: usize,
}

impl Default for ImagenSettings {
    fn default() -> Self {
        Self {
            project: None,
            location: "us-central1".to_string(),
            model: "imagegeneration@006".to_string(),
            access_token: None,
            endpoint: None,
            negative_prompt:
                "photorealistic, realistic, blurry, low quality, watermark, text overlay"
                    .to_string(),
            aspect_ratio: "16:9".to_string(),
            number_of_images: 1,
            max_retries: 3,
        }
    }
}

/// Which storage backend holds generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Google Cloud Storage bucket
    #[default]
    Gcs,
    /// Local content-addressed directory
    Filesystem,
    /// No storage; images are always returned inline
    None,
}

/// Storage settings (`[storage]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Active backend
    pub backend: StorageBackend,
    /// Bucket name (falls back to `GCS_BUCKET_NAME`)
    pub bucket: Option<String>,
    /// Override for the Cloud Storage base URL
    pub endpoint: Option<String>,
    /// Upload objects with the `publicRead` ACL
    pub public_read: bool,
    /// Root directory of the filesystem backend
    pub filesystem_path: String,
    /// Public URL prefix under which the filesystem root is served
    pub public_base_url: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Gcs,
            bucket: None,
            endpoint: None,
            public_read: true,
            filesystem_path: "./media".to_string(),
            public_base_url: None,
        }
    }
}

/// Web server settings (`[server]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Frontend build directory (falls back to `STATIC_FILES_DIR`)
    pub static_dir: Option<String>,
    /// Exact origins allowed by CORS
    pub cors_origins: Vec<String>,
    /// Regex of additionally allowed origins
    pub cors_origin_regex: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            static_dir: None,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            cors_origin_regex: Some(
                r"^https?://(.*\.)?(localhost|127\.0\.0\.1)(:\d+)?$|^https?://.*\.run\.app$"
                    .to_string(),
            ),
        }
    }
}
