//! Story generation pipeline.
//!
//! A [`StoryAgent`] asks the story model for a four-scene story as JSON,
//! which is parsed into a [`Story`]. An [`ImageAgent`] then illustrates each
//! scene through the [`ImagenTool`], which stores images and hands back
//! URLs (or inline base64 when storage is unavailable). [`StoryPipeline`]
//! drives both agents and reports progress as [`ServerMessage`]s.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod agent;
mod extraction;
mod image_prompt;
mod imagen_tool;
mod pipeline;
mod prompt;
mod protocol;
mod session;
mod story;

pub use agent::{
    Agent, AgentEvent, IMAGE_RESULT_KEY, ImageAgent, ImageAgentInput, InvocationContext, Runner,
    STORY_RESPONSE_KEY, StoryAgent,
};
pub use extraction::{extract_json, parse_json};
pub use image_prompt::{SCENE_STYLE_PREFIX, TOOL_STYLE_PREFIX, full_prompt, scene_prompt};
pub use imagen_tool::{
    DEFAULT_NEGATIVE_PROMPT, EMPTY_PROMPT_ERROR, ImageDefaults, ImageEntry, ImageOptions,
    ImageToolResult, ImagenTool,
};
pub use pipeline::{APP_NAME, StoryPipeline};
pub use prompt::{STORY_INSTRUCTIONS, story_request};
pub use protocol::{
    CONNECTED_MESSAGE, ClientMessage, ImagePayload, MessageSink, PROCESSING_MESSAGE,
    ServerMessage,
};
pub use session::{InMemorySessionService, Session, SessionState};
pub use story::{Character, SCENE_COUNT, Scene, SceneTitle, Story};
