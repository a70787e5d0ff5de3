//! Errors raised by `derive_builder` builders.

/// Why a builder refused to build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BuilderErrorKind {
    /// A required field was unset or a value was rejected
    #[display("Builder validation failed: {}", _0)]
    ValidationFailed(String),
}

/// Builder error with location tracking.
///
/// ```
/// use storygen_error::{BuilderError, BuilderErrorKind};
///
/// let err = BuilderError::from("`prompt` must be initialized".to_string());
/// assert!(matches!(err.kind(), BuilderErrorKind::ValidationFailed(_)));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Builder Error: {} at line {} in {}", kind, line, file)]
pub struct BuilderError {
    kind: BuilderErrorKind,
    line: u32,
    file: &'static str,
}

impl BuilderError {
    /// Wrap `kind`, recording the caller's location.
    #[track_caller]
    pub fn new(kind: BuilderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// What went wrong.
    pub fn kind(&self) -> &BuilderErrorKind {
        &self.kind
    }
}

impl From<String> for BuilderError {
    #[track_caller]
    fn from(msg: String) -> Self {
        Self::new(BuilderErrorKind::ValidationFailed(msg))
    }
}
