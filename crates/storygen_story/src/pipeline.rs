//! Keywords to story to illustrations, reported as [`ServerMessage`]s.

use std::sync::Arc;
use std::time::Duration;

use storygen_error::{StoryError, StoryErrorKind, StorygenError, StorygenErrorKind, StorygenResult};
use storygen_interface::StorygenDriver;
use storygen_rate_limit::StorySettings;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    IMAGE_RESULT_KEY, ImageAgent, ImageAgentInput, ImageEntry, ImagePayload, ImageToolResult,
    ImagenTool, InMemorySessionService, MessageSink, Runner, ServerMessage, Story, StoryAgent,
};

/// Application name sessions are created under.
pub const APP_NAME: &str = "storygen_app";

/// Runs the story agent, then the image agent once per scene.
#[derive(Debug)]
pub struct StoryPipeline {
    story_runner: Runner,
    image_runner: Runner,
    scene_delay: Duration,
}

impl StoryPipeline {
    /// Pipeline over a story model and an image tool.
    pub fn new(driver: Arc<dyn StorygenDriver>, tool: Arc<ImagenTool>, settings: &StorySettings) -> Self {
        let sessions = Arc::new(InMemorySessionService::new());
        let story_agent = Arc::new(StoryAgent::new(driver, settings.clone()));
        let image_agent = Arc::new(ImageAgent::new(tool));

        Self {
            story_runner: Runner::with_sessions(APP_NAME, story_agent, sessions.clone()),
            image_runner: Runner::with_sessions(APP_NAME, image_agent, sessions),
            scene_delay: Duration::from_millis(settings.scene_delay_ms),
        }
    }

    /// Replace the pause between scenes.
    pub fn with_scene_delay(mut self, scene_delay: Duration) -> Self {
        self.scene_delay = scene_delay;
        self
    }

    /// Pause between scene illustrations.
    pub fn scene_delay(&self) -> Duration {
        self.scene_delay
    }

    /// Session store shared by both agents.
    pub fn sessions(&self) -> &Arc<InMemorySessionService> {
        self.story_runner.sessions()
    }

    /// Generate a story and its illustrations, streaming progress to `sink`.
    ///
    /// Model failures are reported to the client; only a failing sink
    /// returns an error. Sessions created for the request are deleted
    /// before returning, whatever the outcome.
    #[instrument(skip(self, keywords, sink), fields(keywords_len = keywords.len()))]
    pub async fn run<S>(&self, user_id: &str, keywords: &str, sink: &mut S) -> StorygenResult<()>
    where
        S: MessageSink + ?Sized,
    {
        let mut sessions = RequestSessions::new(self.sessions().clone(), self.story_runner.app_name());
        let outcome = self.run_stages(user_id, keywords, sink, &mut sessions).await;
        sessions.release().await;
        outcome
    }

    async fn run_stages<S>(
        &self,
        user_id: &str,
        keywords: &str,
        sink: &mut S,
        sessions: &mut RequestSessions,
    ) -> StorygenResult<()>
    where
        S: MessageSink + ?Sized,
    {
        info!(keywords, "Starting story workflow");

        let story = match self.generate_story(user_id, keywords, sessions).await {
            Ok(story) => story,
            Err(e) => {
                error!(error = %e, "Story generation failed");
                sink.send(ServerMessage::error(format!(
                    "Story generation failed: {}",
                    failure_message(&e)
                )))
                .await?;
                return Ok(());
            }
        };

        let text = story.text_with_scene_markers();
        info!(scenes = story.scenes().len(), chars = text.len(), "Story generated");
        sink.send(ServerMessage::StoryComplete { data: text }).await?;

        let characters = story.character_descriptions();
        info!(characters = characters.len(), "Starting scene illustrations");

        let image_user = format!("{}_image", user_id);
        let session = self.image_runner.create_session(&image_user).await;
        sessions.track(&image_user, session.id());
        let scene_count = story.scenes().len();

        for (position, scene) in story.scenes().iter().enumerate() {
            let index = usize::from(*scene.index()).saturating_sub(1);
            let title = scene.title().to_string();
            info!(scene = index + 1, title = %title, "Illustrating scene");

            let input = ImageAgentInput {
                scene_title: Some(title.clone()),
                scene_description: scene.description().clone(),
                character_descriptions: characters.clone(),
            };

            match self.illustrate(&image_user, session.id(), &input).await {
                Ok(entries) => {
                    for entry in &entries {
                        sink.send(ServerMessage::ImageGenerated {
                            data: ImagePayload::from_entry(index, title.as_str(), entry),
                        })
                        .await?;
                    }
                    info!(scene = index + 1, images = entries.len(), "Scene illustrated");
                }
                Err(e) => {
                    warn!(scene = index + 1, error = %e, "Scene illustration failed, sending placeholder");
                    sink.send(ServerMessage::ImageGenerated {
                        data: ImagePayload::placeholder(
                            index,
                            title.as_str(),
                            format!("Image generation failed: {}", failure_message(&e)),
                        ),
                    })
                    .await?;
                }
            }

            if position + 1 < scene_count {
                tokio::time::sleep(self.scene_delay).await;
            }
        }

        sink.send(ServerMessage::turn_complete()).await?;
        info!("Story workflow complete");
        Ok(())
    }

    async fn generate_story(
        &self,
        user_id: &str,
        keywords: &str,
        sessions: &mut RequestSessions,
    ) -> StorygenResult<Story> {
        let story_user = format!("{}_story", user_id);
        let session = self.story_runner.create_session(&story_user).await;
        sessions.track(&story_user, session.id());

        let events = self
            .story_runner
            .run(&story_user, session.id(), keywords)
            .await?;
        let raw: String = events.iter().filter_map(|event| event.output_text()).collect();

        Ok(Story::from_llm_response(&raw)?)
    }

    async fn illustrate(
        &self,
        user_id: &str,
        session_id: &str,
        input: &ImageAgentInput,
    ) -> StorygenResult<Vec<ImageEntry>> {
        let input = serde_json::to_string(input)
            .map_err(|e| StoryError::new(StoryErrorKind::AgentInput(e.to_string())))?;
        self.image_runner.run(user_id, session_id, &input).await?;

        let session = self
            .image_runner
            .sessions()
            .get_session(self.image_runner.app_name(), user_id, session_id)
            .await?;
        let raw = session
            .state()
            .get(IMAGE_RESULT_KEY)
            .ok_or_else(|| StoryError::new(StoryErrorKind::MissingImageResult))?;

        let result = ImageToolResult::from_json(raw)
            .map_err(|_| StoryError::new(StoryErrorKind::MissingImageResult))?;
        if let Some(error) = result.error() {
            return Err(StoryError::new(StoryErrorKind::ImageAgent(error.to_string())).into());
        }

        let images = result.images().to_vec();
        if images.is_empty() {
            return Err(StoryError::new(StoryErrorKind::MissingImageResult).into());
        }
        Ok(images)
    }
}

/// Sessions opened for one request.
///
/// [`RequestSessions::release`] deletes them. A request future dropped
/// before that point (client disconnect) deletes them from a spawned task.
struct RequestSessions {
    store: Arc<InMemorySessionService>,
    app_name: String,
    opened: Vec<(String, String)>,
}

impl RequestSessions {
    fn new(store: Arc<InMemorySessionService>, app_name: &str) -> Self {
        Self {
            store,
            app_name: app_name.to_string(),
            opened: Vec::new(),
        }
    }

    fn track(&mut self, user_id: &str, session_id: &str) {
        self.opened.push((user_id.to_string(), session_id.to_string()));
    }

    async fn release(mut self) {
        let opened = std::mem::take(&mut self.opened);
        remove_sessions(&self.store, &self.app_name, opened).await;
    }
}

impl Drop for RequestSessions {
    fn drop(&mut self) {
        if self.opened.is_empty() {
            return;
        }
        let opened = std::mem::take(&mut self.opened);
        let store = self.store.clone();
        let app_name = self.app_name.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { remove_sessions(&store, &app_name, opened).await });
            }
            Err(_) => warn!(sessions = opened.len(), "No runtime to release request sessions"),
        }
    }
}

async fn remove_sessions(
    store: &InMemorySessionService,
    app_name: &str,
    opened: Vec<(String, String)>,
) {
    for (user_id, session_id) in opened {
        if store
            .delete_session(app_name, &user_id, &session_id)
            .await
            .is_some()
        {
            debug!(user_id = %user_id, session_id = %session_id, "Session released");
        }
    }
}

/// Client-facing description of a failure.
///
/// Story errors are reported by kind alone; other errors keep their full
/// description.
fn failure_message(err: &StorygenError) -> String {
    match err.kind() {
        StorygenErrorKind::Story(story) => story.kind.to_string(),
        other => other.to_string(),
    }
}
