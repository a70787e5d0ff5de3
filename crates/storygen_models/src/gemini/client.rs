//! Google Gemini API implementation.
//!
//! The [`GeminiClient`] keeps a pool of model-specific clients, each wrapped
//! in its own rate limiter. A request naming a model (via
//! `GenerateRequest.model`) reuses that model's client or creates one on
//! first use, so each model keeps independent limits from `storygen.toml`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

use gemini_rust::{Gemini, client::Model};

use storygen_core::{GenerateRequest, GenerateResponse, Output, Role};
use storygen_error::{GeminiError, GeminiErrorKind, StorygenResult};
use storygen_interface::{Metadata, ModelMetadata, StorygenDriver};
use storygen_rate_limit::{RateLimiter, RetryPolicy, StorygenConfig, Tier, TierConfig};

use super::GeminiResult;

//
// ─── TIERED GEMINI ──────────────────────────────────────────────────────────────
//

/// Couples a Gemini API client with its rate limiting tier.
///
/// Implements `Tier` by delegating to the inner tier, so the `RateLimiter`
/// owns both the client and its limits and the client cannot be reached
/// without going through rate limiting.
#[derive(Clone)]
pub struct TieredGemini<T: Tier> {
    /// The Gemini API client
    pub client: Gemini,
    /// The tier configuration for rate limiting
    pub tier: T,
}

impl<T: Tier + std::fmt::Debug> std::fmt::Debug for TieredGemini<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredGemini")
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

impl<T: Tier> Tier for TieredGemini<T> {
    fn rpm(&self) -> Option<u32> {
        self.tier.rpm()
    }

    fn tpm(&self) -> Option<u64> {
        self.tier.tpm()
    }

    fn rpd(&self) -> Option<u32> {
        self.tier.rpd()
    }

    fn max_concurrent(&self) -> Option<u32> {
        self.tier.max_concurrent()
    }

    fn name(&self) -> &str {
        self.tier.name()
    }
}

//
// ─── CLIENT ─────────────────────────────────────────────────────────────────────
//

type ClientPool = HashMap<String, RateLimiter<TieredGemini<TierConfig>>>;

/// Client for the Google Gemini API with per-model client pooling.
pub struct GeminiClient {
    clients: Arc<Mutex<ClientPool>>,
    api_key: String,
    model_name: String,
    base_tier: TierConfig,
    retry: RetryPolicy,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let client_count = self.clients.lock().map(|c| c.len()).unwrap_or_default();
        f.debug_struct("GeminiClient")
            .field("model_name", &self.model_name)
            .field("base_tier", &self.base_tier.name())
            .field("cached_clients", &client_count)
            .finish_non_exhaustive()
    }
}

/// Tier used when the configuration has no `providers.gemini` section.
fn default_tier() -> TierConfig {
    TierConfig {
        name: "Free".to_string(),
        rpm: Some(10),
        tpm: Some(250_000),
        rpd: Some(250),
        max_concurrent: Some(1),
        models: HashMap::new(),
    }
}

impl GeminiClient {
    /// Create a client for `model_name` with an explicit API key.
    pub fn new(
        api_key: impl Into<String>,
        model_name: impl Into<String>,
        tier: Option<TierConfig>,
    ) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            api_key: api_key.into(),
            model_name: model_name.into(),
            base_tier: tier.unwrap_or_else(default_tier),
            retry: RetryPolicy::default(),
        }
    }

    /// Create a client reading the API key from `GEMINI_API_KEY`.
    #[instrument(name = "gemini_client_from_env", skip(tier))]
    pub fn from_env(model_name: &str, tier: Option<TierConfig>) -> StorygenResult<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GeminiError::new(GeminiErrorKind::MissingApiKey))?;

        Ok(Self::new(api_key, model_name, tier))
    }

    /// Create a client from loaded configuration.
    ///
    /// Uses `story.model` as the default model, the default `gemini` tier,
    /// and `story.max_retries` for transient-error retries.
    #[instrument(name = "gemini_client_from_config", skip(config))]
    pub fn from_config(config: &StorygenConfig) -> StorygenResult<Self> {
        let tier = config.get_tier("gemini", None);
        let client = Self::from_env(&config.story.model, tier)?.with_retry_policy(RetryPolicy {
            max_retries: config.story.max_retries,
            ..RetryPolicy::default()
        });
        Ok(client)
    }

    /// Replace the retry policy used for newly pooled models.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Base tier (before model-specific overrides).
    pub fn base_tier(&self) -> &TierConfig {
        &self.base_tier
    }

    /// Map a model name onto the gemini-rust `Model` enum.
    ///
    /// - "gemini-2.5-flash" → Model::Gemini25Flash
    /// - "gemini-2.0-flash" → Model::Custom("models/gemini-2.0-flash")
    /// - "models/gemini-2.0-flash" → preserved
    fn model_name_to_enum(name: &str) -> Model {
        match name {
            "gemini-2.5-flash" => Model::Gemini25Flash,
            "gemini-2.5-flash-lite" => Model::Gemini25FlashLite,
            "gemini-2.5-pro" => Model::Gemini25Pro,
            other if other.starts_with("models/") => Model::Custom(other.to_string()),
            other => Model::Custom(format!("models/{}", other)),
        }
    }

    /// Rough token estimate (chars / 4).
    fn estimate_tokens(text: &str) -> u64 {
        (text.len() / 4).max(1) as u64
    }

    /// Get or create the rate-limited client for a model.
    fn pooled_client(
        &self,
        model_name: &str,
    ) -> GeminiResult<RateLimiter<TieredGemini<TierConfig>>> {
        let mut clients = self.clients.lock().map_err(|e| {
            GeminiError::new(GeminiErrorKind::ClientCreation(format!(
                "client pool lock poisoned: {}",
                e
            )))
        })?;

        if let Some(existing) = clients.get(model_name) {
            return Ok(existing.clone());
        }

        let client = Gemini::with_model(&self.api_key, Self::model_name_to_enum(model_name))
            .map_err(|e| GeminiError::new(GeminiErrorKind::ClientCreation(e.to_string())))?;

        let tiered = TieredGemini {
            client,
            tier: self.base_tier.for_model(model_name),
        };
        let limiter = RateLimiter::new(tiered).with_retry_policy(self.retry);

        debug!(model = model_name, "Created pooled Gemini client");
        clients.insert(model_name.to_string(), limiter.clone());
        Ok(limiter)
    }

    /// Internal generate method that returns Gemini-specific errors.
    async fn generate_internal(&self, req: &GenerateRequest) -> GeminiResult<GenerateResponse> {
        let model_name = req.model.as_deref().unwrap_or(&self.model_name);
        let rate_limited_client = self.pooled_client(model_name)?;

        let estimated_tokens: u64 = req
            .messages
            .iter()
            .flat_map(|msg| &msg.content)
            .map(|input| Self::estimate_tokens(input.text()))
            .sum();
        let total_estimate = estimated_tokens + req.max_tokens.unwrap_or(1000) as u64;

        let limiter = &rate_limited_client;
        let response = rate_limited_client
            .execute(total_estimate, move || async move {
                let client = &limiter.inner().client;
                let mut builder = client.generate_content();
                let mut system_prompt = None;

                for msg in &req.messages {
                    match msg.role {
                        // Gemini takes the system prompt separately
                        Role::System => system_prompt = Some(msg.joined_text()),
                        Role::User => {
                            for input in &msg.content {
                                builder = builder.with_user_message(input.text());
                            }
                        }
                        Role::Assistant => {
                            builder = builder.with_model_message(msg.joined_text());
                        }
                    }
                }

                if let Some(prompt) = system_prompt {
                    builder = builder.with_system_prompt(&prompt);
                }

                if let Some(temp) = req.temperature {
                    builder = builder.with_temperature(temp);
                }

                if let Some(max_tok) = req.max_tokens {
                    builder = builder.with_max_output_tokens(max_tok as i32);
                }

                builder.execute().await.map_err(Self::parse_gemini_error)
            })
            .await?;

        let text = response.text();
        if text.trim().is_empty() {
            return Err(GeminiError::new(GeminiErrorKind::EmptyResponse));
        }

        debug!(model = model_name, chars = text.len(), "Gemini response received");

        Ok(GenerateResponse {
            outputs: vec![Output::Text(text)],
        })
    }

    /// Convert gemini-rust errors into structured errors, keeping HTTP status
    /// codes when the message carries one.
    pub(crate) fn parse_gemini_error(err: impl std::fmt::Display) -> GeminiError {
        let err_msg = err.to_string();

        match Self::extract_status_code(&err_msg) {
            Some(status_code) => GeminiError::new(GeminiErrorKind::HttpError {
                status_code,
                message: err_msg,
            }),
            None => GeminiError::new(GeminiErrorKind::ApiRequest(err_msg)),
        }
    }

    /// Parse "... code 503; description: ..." style messages.
    fn extract_status_code(error_msg: &str) -> Option<u16> {
        let code_start = error_msg.find("code ")?;
        let code_str = &error_msg[code_start + 5..];
        let end = code_str
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(code_str.len());
        code_str[..end].parse().ok()
    }
}

#[async_trait]
impl StorygenDriver for GeminiClient {
    #[instrument(skip(self, req), fields(model = req.model.as_deref().unwrap_or(&self.model_name)))]
    async fn generate(&self, req: &GenerateRequest) -> StorygenResult<GenerateResponse> {
        self.generate_internal(req).await.map_err(Into::into)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    /// Default model used when `GenerateRequest.model` is `None`.
    fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl Metadata for GeminiClient {
    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            provider: "gemini",
            model: self.model_name.clone(),
            max_input_tokens: 1_048_576,
            max_output_tokens: 65_536,
            supports_vision: false,
            supports_json_mode: true,
        }
    }
}
