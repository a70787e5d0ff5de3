//! Agents, invocation contexts, and the runner that ties them to sessions.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storygen_error::{StoryError, StoryErrorKind, StorygenResult};
use storygen_interface::StorygenDriver;
use storygen_rate_limit::StorySettings;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{ImageOptions, ImagenTool, InMemorySessionService, Session, scene_prompt, story_request};

/// Session key holding the story model's raw response.
pub const STORY_RESPONSE_KEY: &str = "story_response";

/// Session key holding the image tool's JSON result.
pub const IMAGE_RESULT_KEY: &str = "image_result";

/// Something an agent observed or produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Intermediate observation
    Thought {
        /// What the agent noticed or is about to do
        observation: String,
    },
    /// Final output text
    Output {
        /// Output text
        text: String,
    },
}

impl AgentEvent {
    /// Thought event.
    pub fn thought(observation: impl Into<String>) -> Self {
        Self::Thought {
            observation: observation.into(),
        }
    }

    /// Output event.
    pub fn output(text: impl Into<String>) -> Self {
        Self::Output { text: text.into() }
    }

    /// Text of an output event.
    pub fn output_text(&self) -> Option<&str> {
        match self {
            Self::Output { text } => Some(text),
            Self::Thought { .. } => None,
        }
    }
}

/// Everything an agent sees during one invocation.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Unique id of this invocation
    pub invocation_id: String,
    /// User input text
    pub input: String,
    /// Session the invocation runs in; state changes are written back
    pub session: Session,
}

impl InvocationContext {
    /// Context for `input` inside `session`.
    pub fn new(input: impl Into<String>, session: Session) -> Self {
        Self {
            invocation_id: Uuid::new_v4().to_string(),
            input: input.into(),
            session,
        }
    }
}

/// A unit that consumes input and yields events.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name used in logs.
    fn name(&self) -> &str;

    /// Handle one invocation.
    async fn run(&self, ctx: &mut InvocationContext) -> StorygenResult<Vec<AgentEvent>>;
}

/// Runs an agent inside stored sessions.
pub struct Runner {
    app_name: String,
    agent: Arc<dyn Agent>,
    sessions: Arc<InMemorySessionService>,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("app_name", &self.app_name)
            .field("agent", &self.agent.name())
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Runner with its own session store.
    pub fn new(app_name: impl Into<String>, agent: Arc<dyn Agent>) -> Self {
        Self::with_sessions(app_name, agent, Arc::new(InMemorySessionService::new()))
    }

    /// Runner sharing an existing session store.
    pub fn with_sessions(
        app_name: impl Into<String>,
        agent: Arc<dyn Agent>,
        sessions: Arc<InMemorySessionService>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
            sessions,
        }
    }

    /// Application name sessions are created under.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Session store.
    pub fn sessions(&self) -> &Arc<InMemorySessionService> {
        &self.sessions
    }

    /// Create a fresh session for `user_id`.
    pub async fn create_session(&self, user_id: &str) -> Session {
        self.sessions.create_session(&self.app_name, user_id).await
    }

    /// Run the agent on `input` in an existing session.
    ///
    /// State changes made by the agent are written back even when the
    /// agent fails.
    #[instrument(skip(self, input), fields(agent = self.agent.name()))]
    pub async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        input: &str,
    ) -> StorygenResult<Vec<AgentEvent>> {
        let session = self
            .sessions
            .get_session(&self.app_name, user_id, session_id)
            .await?;
        let mut ctx = InvocationContext::new(input, session);
        debug!(invocation_id = %ctx.invocation_id, "Invoking agent");

        let outcome = self.agent.run(&mut ctx).await;

        self.sessions
            .update_state(&self.app_name, user_id, session_id, ctx.session.state().clone())
            .await?;

        let events = outcome?;
        debug!(events = events.len(), "Agent finished");
        Ok(events)
    }
}

/// Asks the story model for a story about the input keywords.
pub struct StoryAgent {
    driver: Arc<dyn StorygenDriver>,
    settings: StorySettings,
}

impl StoryAgent {
    /// Agent backed by `driver`.
    pub fn new(driver: Arc<dyn StorygenDriver>, settings: StorySettings) -> Self {
        Self { driver, settings }
    }
}

#[async_trait]
impl Agent for StoryAgent {
    fn name(&self) -> &str {
        "story_agent"
    }

    async fn run(&self, ctx: &mut InvocationContext) -> StorygenResult<Vec<AgentEvent>> {
        let request = story_request(&ctx.input, &self.settings);
        let response = self.driver.generate(&request).await?;

        let text = response.text();
        if text.trim().is_empty() {
            return Err(StoryError::new(StoryErrorKind::EmptyAgentOutput(self.name().to_string())).into());
        }

        info!(
            provider = self.driver.provider_name(),
            chars = text.len(),
            "Story response received"
        );
        ctx.session.state_mut().set(STORY_RESPONSE_KEY, text.clone());
        Ok(vec![AgentEvent::output(text)])
    }
}

/// Input of the image agent, sent as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAgentInput {
    /// Scene label, logged when the scene is illustrated
    #[serde(default)]
    pub scene_title: Option<String>,
    /// Action and setting of the scene
    pub scene_description: String,
    /// `"{name}: {description}"` per character
    #[serde(default)]
    pub character_descriptions: Vec<String>,
}

impl ImageAgentInput {
    /// The scene title, or `"untitled"` when none was sent.
    pub fn label(&self) -> &str {
        self.scene_title.as_deref().unwrap_or("untitled")
    }
}

/// Illustrates one scene with the image tool.
///
/// The tool's JSON result is stored under [`IMAGE_RESULT_KEY`]. Failures
/// are stored there too, as `{"success": false, "error": "An error occurred: ..."}`,
/// so the agent itself never fails.
pub struct ImageAgent {
    tool: Arc<ImagenTool>,
    options: ImageOptions,
}

impl ImageAgent {
    /// Agent using `tool` with its default options.
    pub fn new(tool: Arc<ImagenTool>) -> Self {
        Self {
            tool,
            options: ImageOptions::default(),
        }
    }

    /// Override the options passed to the tool.
    pub fn with_options(mut self, options: ImageOptions) -> Self {
        self.options = options;
        self
    }

    async fn illustrate(
        &self,
        input: &str,
        events: &mut Vec<AgentEvent>,
    ) -> Result<String, String> {
        let input: ImageAgentInput = serde_json::from_str(input).map_err(|e| e.to_string())?;

        let prompt = scene_prompt(&input.scene_description, &input.character_descriptions);
        info!(scene = input.label(), "Illustrating scene");
        events.push(AgentEvent::thought(format!(
            "Generating image with prompt: {}",
            prompt
        )));

        let result = self.tool.run(&prompt, &self.options).await;
        match result.error() {
            Some(error) => Err(error.to_string()),
            None => Ok(result.to_json()),
        }
    }
}

#[async_trait]
impl Agent for ImageAgent {
    fn name(&self) -> &str {
        "image_agent"
    }

    async fn run(&self, ctx: &mut InvocationContext) -> StorygenResult<Vec<AgentEvent>> {
        let mut events = Vec::new();

        match self.illustrate(&ctx.input, &mut events).await {
            Ok(json) => {
                ctx.session.state_mut().set(IMAGE_RESULT_KEY, json.clone());
                events.push(AgentEvent::thought(format!(
                    "Image generated successfully: {}",
                    json
                )));
                events.push(AgentEvent::output(json));
            }
            Err(error) => {
                let message = format!("An error occurred: {}", error);
                warn!(error = %message, "Image agent failed");
                let stored = serde_json::json!({"success": false, "error": message});
                ctx.session
                    .state_mut()
                    .set(IMAGE_RESULT_KEY, stored.to_string());
                events.push(AgentEvent::thought(message.clone()));
                events.push(AgentEvent::output(message));
            }
        }

        Ok(events)
    }
}
