//! Shared handler state.

use std::sync::Arc;

use storygen_story::StoryPipeline;

/// State handed to every request handler.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Pipeline for story requests; `None` when the models could not be set up
    pub pipeline: Option<Arc<StoryPipeline>>,
}

impl AppState {
    /// State serving `pipeline`.
    pub fn new(pipeline: Option<Arc<StoryPipeline>>) -> Self {
        Self { pipeline }
    }
}
