//! Top-level error wrapper types.

use crate::{
    BackendError, BuilderError, ConfigError, GeminiError, ImagenError, JsonError, ServerError,
    StorageError, StoryError,
};

/// Every error domain in the workspace.
///
/// # Examples
///
/// ```
/// use storygen_error::{StorygenError, StorygenErrorKind, StoryError, StoryErrorKind};
///
/// let err: StorygenError = StoryError::new(StoryErrorKind::SceneCount(2)).into();
/// assert!(matches!(err.kind(), StorygenErrorKind::Story(_)));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum StorygenErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Generic backend error
    #[from(BackendError)]
    Backend(BackendError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Object storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Gemini (story model) error
    #[from(GeminiError)]
    Gemini(GeminiError),
    /// Imagen (image model) error
    #[from(ImagenError)]
    Imagen(ImagenError),
    /// Story parsing or agent error
    #[from(StoryError)]
    Story(StoryError),
    /// Web server error
    #[from(ServerError)]
    Server(ServerError),
}

/// Storygen error with kind discrimination.
///
/// # Examples
///
/// ```
/// use storygen_error::{StorygenResult, ConfigError};
///
/// fn might_fail() -> StorygenResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Storygen Error: {}", _0)]
pub struct StorygenError(Box<StorygenErrorKind>);

impl StorygenError {
    /// Create a new error from a kind.
    pub fn new(kind: StorygenErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StorygenErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to StorygenErrorKind
impl<T> From<T> for StorygenError
where
    T: Into<StorygenErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for storygen operations.
pub type StorygenResult<T> = std::result::Result<T, StorygenError>;
