//! Imagen (Vertex AI image generation) error types.

use crate::RetryableError;

/// Imagen-specific error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ImagenErrorKind {
    /// No Google Cloud project configured
    #[display("GOOGLE_CLOUD_PROJECT environment variable not set")]
    MissingProject,
    /// No OAuth access token configured
    #[display("GOOGLE_OAUTH_ACCESS_TOKEN environment variable not set")]
    MissingAccessToken,
    /// Request could not be sent
    #[display("Imagen request failed: {}", _0)]
    Request(String),
    /// HTTP error with status code and message
    #[display("HTTP {} error: {}", status_code, message)]
    HttpError {
        /// HTTP status code
        status_code: u16,
        /// Error body
        message: String,
    },
    /// Response body was not the expected prediction payload
    #[display("Malformed Imagen response: {}", _0)]
    MalformedResponse(String),
    /// Prediction carried invalid base64
    #[display("Base64 decode error: {}", _0)]
    Base64Decode(String),
}

impl ImagenErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ImagenErrorKind::HttpError { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            ImagenErrorKind::Request(_) => true,
            _ => false,
        }
    }
}

/// Imagen error with source location tracking.
///
/// # Examples
///
/// ```
/// use storygen_error::{ImagenError, ImagenErrorKind, RetryableError};
///
/// let err = ImagenError::new(ImagenErrorKind::HttpError {
///     status_code: 429,
///     message: "Quota exceeded".to_string(),
/// });
/// assert!(err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Imagen Error: {} at line {} in {}", kind, line, file)]
pub struct ImagenError {
    /// The kind of error that occurred
    pub kind: ImagenErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ImagenError {
    /// Create a new ImagenError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ImagenErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl RetryableError for ImagenError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match self.kind {
            ImagenErrorKind::HttpError {
                status_code: 429, ..
            } => (5000, 3, 40),
            _ => (2000, 3, 30),
        }
    }
}
