//! End-to-end pipeline runs against mock models.

mod test_utils;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use storygen_error::{GeminiErrorKind, ImagenErrorKind, ServerError, ServerErrorKind, StorygenResult};
use storygen_rate_limit::StorySettings;
use storygen_story::{ImagePayload, ImagenTool, MessageSink, ServerMessage, StoryPipeline};
use test_utils::{MemoryStorage, MockImageGenerator, MockResponse, MockStoryDriver, sample_story_json};
use tokio::sync::mpsc;

fn pipeline(driver: MockStoryDriver, tool: ImagenTool) -> StoryPipeline {
    StoryPipeline::new(Arc::new(driver), Arc::new(tool), &StorySettings::default())
        .with_scene_delay(Duration::ZERO)
}

fn images(messages: &[ServerMessage]) -> Vec<&ImagePayload> {
    messages
        .iter()
        .filter_map(|message| match message {
            ServerMessage::ImageGenerated { data } => Some(data),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn full_run_sends_story_images_and_completion() {
    let storage = Arc::new(MemoryStorage::public("https://storage.googleapis.com/b"));
    let tool = ImagenTool::new(Arc::new(MockImageGenerator::new_success()))
        .with_storage(storage.clone(), Some("b".to_string()));
    let pipeline = pipeline(MockStoryDriver::new_success(sample_story_json()), tool);

    let mut messages: Vec<ServerMessage> = Vec::new();
    pipeline.run("alice", "frog, lantern", &mut messages).await.unwrap();

    assert_eq!(messages.len(), 6);
    assert_eq!(
        messages[0],
        ServerMessage::StoryComplete {
            data: "[SCENE 1]\nPip the frog found a lantern.\n\n\
                   [SCENE 2]\nThe lantern flickered out.\n\n\
                   [SCENE 3]\nPip climbed the old oak to relight it.\n\n\
                   [SCENE 4]\nThe forest glowed again."
                .to_string()
        }
    );
    assert_eq!(messages[5], ServerMessage::turn_complete());

    let payloads = images(&messages);
    let indices: Vec<usize> = payloads.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(payloads[2].scene_title, "The Climax");
    assert!(payloads.iter().all(|p| p.stored_in_bucket && p.gcs_url.is_some()));
    assert_eq!(storage.object_names().len(), 4);
}

#[tokio::test]
async fn scene_prompts_include_every_character() {
    let generator = Arc::new(MockImageGenerator::new_success());
    let tool = ImagenTool::new(generator.clone());
    let pipeline = pipeline(MockStoryDriver::new_success(sample_story_json()), tool);

    let mut messages: Vec<ServerMessage> = Vec::new();
    pipeline.run("alice", "frog", &mut messages).await.unwrap();

    let requests = generator.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests[0].prompt().contains("Scene: A mossy forest clearing at dusk."));
    for request in &requests {
        assert!(request.prompt().contains(
            "Characters: Pip: a small green frog with a yellow scarf, Lumi: a glowing paper lantern shaped like a moon."
        ));
    }

    // Without storage every image is inline
    assert!(images(&messages).iter().all(|p| p.base64.is_some() && !p.stored_in_bucket));
}

#[tokio::test]
async fn invalid_story_stops_before_images() {
    let generator = Arc::new(MockImageGenerator::new_success());
    let pipeline = pipeline(
        MockStoryDriver::new_success("Sorry, I cannot write that story."),
        ImagenTool::new(generator.clone()),
    );

    let mut messages: Vec<ServerMessage> = Vec::new();
    pipeline.run("bob", "x", &mut messages).await.unwrap();

    assert_eq!(messages.len(), 1);
    match &messages[0] {
        ServerMessage::Error { message } => {
            assert!(message.starts_with("Story generation failed: No JSON found"))
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn model_failure_is_reported() {
    let pipeline = pipeline(
        MockStoryDriver::new_sequence(vec![MockResponse::Error(GeminiErrorKind::HttpError {
            status_code: 500,
            message: "internal".to_string(),
        })]),
        ImagenTool::new(Arc::new(MockImageGenerator::new_success())),
    );

    let mut messages: Vec<ServerMessage> = Vec::new();
    pipeline.run("bob", "x", &mut messages).await.unwrap();

    assert!(matches!(
        &messages[..],
        [ServerMessage::Error { message }] if message.starts_with("Story generation failed: ") && message.contains("internal")
    ));
}

#[tokio::test]
async fn failed_scene_gets_placeholder_and_run_continues() {
    let generator = MockImageGenerator::new_failing_calls(
        vec![2],
        ImagenErrorKind::HttpError {
            status_code: 400,
            message: "safety filter".to_string(),
        },
    );
    let pipeline = pipeline(
        MockStoryDriver::new_success(sample_story_json()),
        ImagenTool::new(Arc::new(generator)),
    );

    let mut messages: Vec<ServerMessage> = Vec::new();
    pipeline.run("carol", "x", &mut messages).await.unwrap();

    let payloads = images(&messages);
    assert_eq!(payloads.len(), 4);

    let failed = payloads[1];
    assert_eq!(failed.index, 1);
    assert_eq!(failed.scene_title, "The Inciting Incident");
    assert_eq!(failed.placeholder, Some(true));
    assert!(!failed.stored_in_bucket);
    assert_eq!(failed.format, "png");
    let error = failed.error.as_deref().unwrap();
    assert!(error.starts_with("Image generation failed: "));
    assert!(error.contains("safety filter"));

    assert!(payloads[2].base64.is_some());
    assert_eq!(messages.last(), Some(&ServerMessage::turn_complete()));
}

/// Sink that accepts `capacity` messages, then fails.
struct ClosingSink {
    capacity: usize,
    received: Vec<ServerMessage>,
}

#[async_trait]
impl MessageSink for ClosingSink {
    async fn send(&mut self, message: ServerMessage) -> StorygenResult<()> {
        if self.received.len() >= self.capacity {
            return Err(ServerError::new(ServerErrorKind::WebSocketSend("closed".to_string())).into());
        }
        self.received.push(message);
        Ok(())
    }
}

#[tokio::test]
async fn sessions_are_released_after_each_request() {
    let pipeline = pipeline(
        MockStoryDriver::new_success(sample_story_json()),
        ImagenTool::new(Arc::new(MockImageGenerator::new_success())),
    );

    for user in ["dave", "dora", "dina"] {
        let mut messages: Vec<ServerMessage> = Vec::new();
        pipeline.run(user, "x", &mut messages).await.unwrap();
        assert_eq!(messages.last(), Some(&ServerMessage::turn_complete()));
    }

    assert!(pipeline.sessions().is_empty().await);
}

#[tokio::test]
async fn story_failure_releases_sessions() {
    let pipeline = pipeline(
        MockStoryDriver::new_success("no story here"),
        ImagenTool::new(Arc::new(MockImageGenerator::new_success())),
    );

    let mut messages: Vec<ServerMessage> = Vec::new();
    pipeline.run("gus", "x", &mut messages).await.unwrap();

    assert!(matches!(&messages[..], [ServerMessage::Error { .. }]));
    assert!(pipeline.sessions().is_empty().await);
}

#[tokio::test]
async fn sink_failure_releases_sessions() {
    let pipeline = pipeline(
        MockStoryDriver::new_success(sample_story_json()),
        ImagenTool::new(Arc::new(MockImageGenerator::new_success())),
    );

    let mut sink = ClosingSink {
        capacity: 2,
        received: Vec::new(),
    };
    assert!(pipeline.run("hal", "x", &mut sink).await.is_err());

    assert_eq!(sink.received.len(), 2);
    assert!(pipeline.sessions().is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn delay_applies_between_scenes_only() {
    let pipeline = StoryPipeline::new(
        Arc::new(MockStoryDriver::new_success(sample_story_json())),
        Arc::new(ImagenTool::new(Arc::new(MockImageGenerator::new_success()))),
        &StorySettings::default(),
    );
    assert_eq!(pipeline.scene_delay(), Duration::from_millis(2000));

    let start = tokio::time::Instant::now();
    let mut messages: Vec<ServerMessage> = Vec::new();
    pipeline.run("erin", "x", &mut messages).await.unwrap();

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(6000));
    assert!(elapsed < Duration::from_millis(8000));
}

#[tokio::test]
async fn channel_sink_streams_messages() {
    let pipeline = pipeline(
        MockStoryDriver::new_success(sample_story_json()),
        ImagenTool::new(Arc::new(MockImageGenerator::new_success())),
    );
    let (mut tx, mut rx) = mpsc::channel(16);

    pipeline.run("frank", "x", &mut tx).await.unwrap();
    drop(tx);

    let mut received = Vec::new();
    while let Some(message) = rx.recv().await {
        received.push(message);
    }
    assert!(matches!(received.first(), Some(ServerMessage::StoryComplete { .. })));
    assert_eq!(received.last(), Some(&ServerMessage::turn_complete()));
}
