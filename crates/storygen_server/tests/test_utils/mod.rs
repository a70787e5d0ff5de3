//! Shared helpers for server tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use storygen_core::{GenerateRequest, GenerateResponse, GeneratedImage, ImageRequest, Output};
use storygen_error::StorygenResult;
use storygen_interface::{ImageGenerator, StorygenDriver};
use storygen_rate_limit::{ServerSettings, StorySettings};
use storygen_server::StoryServer;
use storygen_story::{ImagenTool, StoryPipeline};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

pub const STORY_JSON: &str = r#"{
  "story": "A snail raced. It rained. It slid. It won.",
  "main_characters": [{"name": "Sol", "description": "a tiny orange snail with a striped shell"}],
  "scenes": [
    {"index": 1, "title": "The Setup", "description": "A garden path", "text": "A snail raced."},
    {"index": 2, "title": "The Inciting Incident", "description": "Dark clouds", "text": "It rained."},
    {"index": 3, "title": "The Climax", "description": "A wet leaf slide", "text": "It slid."},
    {"index": 4, "title": "The Resolution", "description": "A finish line of pebbles", "text": "It won."}
  ]
}"#;

/// Story model that always answers with [`STORY_JSON`].
pub struct FixedStoryDriver;

#[async_trait]
impl StorygenDriver for FixedStoryDriver {
    async fn generate(&self, _req: &GenerateRequest) -> StorygenResult<GenerateResponse> {
        Ok(GenerateResponse {
            outputs: vec![Output::Text(STORY_JSON.to_string())],
        })
    }

    fn provider_name(&self) -> &'static str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed-story"
    }
}

/// Image model returning one tiny PNG per request.
pub struct PngGenerator;

#[async_trait]
impl ImageGenerator for PngGenerator {
    async fn generate_images(&self, _req: &ImageRequest) -> StorygenResult<Vec<GeneratedImage>> {
        Ok(vec![GeneratedImage::png(vec![0x89, b'P', b'N', b'G'])])
    }

    fn provider_name(&self) -> &'static str {
        "png"
    }

    fn model_name(&self) -> &str {
        "png-model"
    }
}

pub fn pipeline() -> Arc<StoryPipeline> {
    Arc::new(
        StoryPipeline::new(
            Arc::new(FixedStoryDriver),
            Arc::new(ImagenTool::new(Arc::new(PngGenerator))),
            &StorySettings::default(),
        )
        .with_scene_delay(Duration::ZERO),
    )
}

pub fn settings() -> ServerSettings {
    ServerSettings {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerSettings::default()
    }
}

/// Run `server` on an ephemeral port until the returned sender fires.
pub async fn spawn(server: StoryServer) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    tokio::spawn(async move {
        server
            .serve_on(listener, async move {
                let _ = stopped.await;
            })
            .await
            .unwrap();
    });

    (addr, stop)
}

/// Next text frame, parsed as JSON.
pub async fn next_json<S>(socket: &mut S) -> serde_json::Value
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("websocket error");
        if let Message::Text(_) = frame {
            return serde_json::from_str(frame.to_text().unwrap()).unwrap();
        }
    }
}
