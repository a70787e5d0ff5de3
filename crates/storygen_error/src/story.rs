//! Story generation error types.

/// Specific error conditions for story parsing and agent execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoryErrorKind {
    /// Model response contained no JSON
    #[display("No JSON found in story response (length: {})", _0)]
    NoJson(usize),
    /// JSON did not match the expected shape
    #[display("Story agent returned invalid JSON format: {}", _0)]
    InvalidJson(String),
    /// Wrong number of scenes
    #[display("Story must have exactly 4 scenes, found {}", _0)]
    SceneCount(usize),
    /// Scene indices are not exactly 1 through 4
    #[display("Scene index {} is out of range or duplicated", _0)]
    SceneIndex(u8),
    /// Scene title does not match its position
    #[display("Scene {} has title '{}', expected '{}'", index, found, expected)]
    SceneTitle {
        /// Scene index
        index: u8,
        /// Title given by the model
        found: String,
        /// Title required for the index
        expected: String,
    },
    /// Wrong number of main characters
    #[display("Story must have 1 or 2 main characters, found {}", _0)]
    CharacterCount(usize),
    /// Character has an empty name or description
    #[display("Character {} is missing a name or description", _0)]
    IncompleteCharacter(usize),
    /// Agent produced no output text
    #[display("Agent '{}' produced no output", _0)]
    EmptyAgentOutput(String),
    /// Session lookup failed
    #[display("Session '{}' not found for user '{}'", session_id, user_id)]
    SessionNotFound {
        /// User the session belongs to
        user_id: String,
        /// Session identifier
        session_id: String,
    },
    /// Image agent left no usable result in session state
    #[display("Image agent did not return valid image data")]
    MissingImageResult,
    /// Image agent reported a failure in its result
    #[display("{}", _0)]
    ImageAgent(String),
    /// Agent input could not be encoded
    #[display("Failed to encode agent input: {}", _0)]
    AgentInput(String),
}

/// Story error with location tracking.
///
/// # Examples
///
/// ```
/// use storygen_error::{StoryError, StoryErrorKind};
///
/// let err = StoryError::new(StoryErrorKind::SceneCount(3));
/// assert!(format!("{}", err).contains("exactly 4 scenes"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Story Error: {} at line {} in {}", kind, line, file)]
pub struct StoryError {
    /// The kind of error that occurred
    pub kind: StoryErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoryError {
    /// Create a new StoryError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
