//! Messages exchanged with the frontend over the websocket.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storygen_error::{ServerError, ServerErrorKind, StorygenResult};
use tokio::sync::mpsc;

use crate::ImageEntry;

/// Greeting sent when a client connects.
pub const CONNECTED_MESSAGE: &str = "Connected to StoryGen backend (agent-based)";

/// Notice sent before a story request is processed.
pub const PROCESSING_MESSAGE: &str = "Generating story and images with agents...";

/// Illustration of one scene, or a placeholder when it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// 0-based scene position
    pub index: usize,
    /// Scene label
    pub scene_title: String,
    /// Image format
    pub format: String,
    /// Whether `gcs_url` points at stored bytes
    pub stored_in_bucket: bool,
    /// Public image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcs_url: Option<String>,
    /// Inline image bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    /// What went wrong
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Marks a slot with no image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<bool>,
}

impl ImagePayload {
    /// Payload for one image tool entry.
    pub fn from_entry(index: usize, scene_title: impl Into<String>, entry: &ImageEntry) -> Self {
        Self {
            index,
            scene_title: scene_title.into(),
            format: entry.format().clone().unwrap_or_else(|| "png".to_string()),
            stored_in_bucket: entry.is_stored(),
            gcs_url: entry.gcs_url().clone(),
            base64: entry.base64().clone(),
            error: entry.error().clone(),
            placeholder: None,
        }
    }

    /// Placeholder for a scene whose illustration failed.
    pub fn placeholder(index: usize, scene_title: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            index,
            scene_title: scene_title.into(),
            format: "png".to_string(),
            stored_in_bucket: false,
            gcs_url: None,
            base64: None,
            error: Some(error.into()),
            placeholder: Some(true),
        }
    }
}

/// Server to client message, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection accepted
    Connected {
        /// Greeting
        message: String,
    },
    /// Request accepted, work started
    Processing {
        /// Progress notice
        message: String,
    },
    /// Story text with `[SCENE n]` markers
    StoryComplete {
        /// Marked-up story text
        data: String,
    },
    /// One scene illustration
    ImageGenerated {
        /// Image or placeholder
        data: ImagePayload,
    },
    /// Request failed
    Error {
        /// Failure description
        message: String,
    },
    /// All work for the request is done
    TurnComplete {
        /// Always `true`
        turn_complete: bool,
    },
    /// Reply to `ping`
    Pong,
}

impl ServerMessage {
    /// Greeting for a new connection.
    pub fn connected() -> Self {
        Self::Connected {
            message: CONNECTED_MESSAGE.to_string(),
        }
    }

    /// Work-started notice.
    pub fn processing() -> Self {
        Self::Processing {
            message: PROCESSING_MESSAGE.to_string(),
        }
    }

    /// Error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// End-of-turn marker.
    pub fn turn_complete() -> Self {
        Self::TurnComplete {
            turn_complete: true,
        }
    }

    /// Serialize to the websocket text frame.
    pub fn to_json(&self) -> StorygenResult<String> {
        serde_json::to_string(self)
            .map_err(|e| storygen_error::JsonError::new(e.to_string()).into())
    }
}

/// Client to server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Generate a story from the keywords in `data`
    GenerateStory {
        /// Keywords
        data: String,
    },
    /// Keepalive
    Ping,
    /// Any other `type` (or none), ignored by the server
    Unknown(Option<String>),
}

impl ClientMessage {
    /// Parse a websocket text frame.
    ///
    /// Only malformed JSON is an error; unexpected shapes become
    /// [`ClientMessage::Unknown`].
    ///
    /// ```
    /// use storygen_story::ClientMessage;
    ///
    /// let msg = ClientMessage::parse(r#"{"type": "generate_story", "data": "owl, moon"}"#).unwrap();
    /// assert_eq!(msg, ClientMessage::GenerateStory { data: "owl, moon".to_string() });
    /// ```
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        Ok(match value.get("type").and_then(Value::as_str) {
            Some("generate_story") => Self::GenerateStory {
                data: match value.get("data") {
                    Some(Value::String(data)) => data.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                },
            },
            Some("ping") => Self::Ping,
            other => Self::Unknown(other.map(str::to_string)),
        })
    }
}

/// Destination for pipeline messages.
#[async_trait]
pub trait MessageSink: Send {
    /// Deliver one message.
    async fn send(&mut self, message: ServerMessage) -> StorygenResult<()>;
}

#[async_trait]
impl MessageSink for mpsc::Sender<ServerMessage> {
    async fn send(&mut self, message: ServerMessage) -> StorygenResult<()> {
        mpsc::Sender::send(self, message)
            .await
            .map_err(|e| ServerError::new(ServerErrorKind::WebSocketSend(e.to_string())).into())
    }
}

#[async_trait]
impl MessageSink for Vec<ServerMessage> {
    async fn send(&mut self, message: ServerMessage) -> StorygenResult<()> {
        self.push(message);
        Ok(())
    }
}
