//! Image generation request and result types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Output aspect ratio supported by the image model.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
)]
pub enum AspectRatio {
    /// 1:1
    #[strum(serialize = "1:1")]
    #[serde(rename = "1:1")]
    Square,
    /// 3:4
    #[strum(serialize = "3:4")]
    #[serde(rename = "3:4")]
    Portrait,
    /// 4:3
    #[strum(serialize = "4:3")]
    #[serde(rename = "4:3")]
    Landscape,
    /// 9:16
    #[strum(serialize = "9:16")]
    #[serde(rename = "9:16")]
    Tall,
    /// 16:9
    #[default]
    #[strum(serialize = "16:9")]
    #[serde(rename = "16:9")]
    Wide,
}

/// Request for the image model.
///
/// # Examples
///
/// ```
/// use storygen_core::{AspectRatio, ImageRequest};
///
/// let request = ImageRequest::builder()
///     .prompt("A friendly robot")
///     .negative_prompt(Some("blurry".to_string()))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.prompt(), "A friendly robot");
/// assert_eq!(*request.number_of_images(), 1);
/// assert_eq!(*request.aspect_ratio(), AspectRatio::Wide);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder, derive_getters::Getters)]
#[builder(setter(into))]
pub struct ImageRequest {
    /// Full text prompt
    prompt: String,
    /// Content the model should avoid
    #[builder(default)]
    negative_prompt: Option<String>,
    /// Output aspect ratio
    #[builder(default)]
    aspect_ratio: AspectRatio,
    /// Number of images to generate
    #[builder(default = "1")]
    number_of_images: u32,
    /// Model identifier override
    #[builder(default)]
    model: Option<String>,
}

impl ImageRequest {
    /// Creates a new request builder.
    pub fn builder() -> ImageRequestBuilder {
        ImageRequestBuilder::default()
    }
}

/// One image returned by the image model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GeneratedImage {
    /// Encoded image bytes
    data: Vec<u8>,
    /// MIME type of the bytes
    mime_type: String,
}

impl GeneratedImage {
    /// Wraps raw image bytes.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Wraps PNG bytes.
    pub fn png(data: Vec<u8>) -> Self {
        Self::new(data, "image/png")
    }

    /// File format derived from the MIME type (`png`, `jpeg`, ...).
    pub fn format(&self) -> &str {
        self.mime_type
            .strip_prefix("image/")
            .unwrap_or(self.mime_type.as_str())
    }

    /// Consumes the image, returning its bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
