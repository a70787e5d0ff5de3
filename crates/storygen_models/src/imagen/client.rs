//! Vertex AI Imagen REST client.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use storygen_core::{GeneratedImage, ImageRequest};
use storygen_error::{ImagenError, ImagenErrorKind, StorygenResult};
use storygen_interface::ImageGenerator;
use storygen_rate_limit::{ImagenSettings, RateLimiter, RetryPolicy, StorygenConfig, TierConfig};

use super::ImagenResult;
use super::dto::{PredictInstance, PredictParameters, PredictRequest, PredictResponse};

/// Client for Imagen models published on Vertex AI.
///
/// Calls
/// `{endpoint}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:predict`
/// with a bearer token and decodes the base64 image bytes from the
/// predictions. Every call goes through a [`RateLimiter`] configured from
/// the `imagen` provider tier.
///
/// # Example
///
/// ```no_run
/// use storygen_core::ImageRequest;
/// use storygen_interface::ImageGenerator;
/// use storygen_models::ImagenClient;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ImagenClient::new("my-project", "us-central1", "imagegeneration@006", "ya29.token", None);
/// let request = ImageRequest::builder().prompt("A friendly robot").build()?;
/// let images = client.generate_images(&request).await?;
/// println!("{} image(s)", images.len());
/// # Ok(())
/// # }
/// ```
pub struct ImagenClient {
    http: Client,
    endpoint: String,
    project: String,
    location: String,
    model: String,
    access_token: String,
    limiter: RateLimiter<TierConfig>,
}

impl std::fmt::Debug for ImagenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagenClient")
            .field("endpoint", &self.endpoint)
            .field("project", &self.project)
            .field("location", &self.location)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ImagenClient {
    /// Create a client for a project and region.
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        model: impl Into<String>,
        access_token: impl Into<String>,
        tier: Option<TierConfig>,
    ) -> Self {
        let location = location.into();
        Self {
            http: Client::new(),
            endpoint: format!("https://{}-aiplatform.googleapis.com", location),
            project: project.into(),
            location,
            model: model.into(),
            access_token: access_token.into(),
            limiter: RateLimiter::new(tier.unwrap_or_else(TierConfig::unlimited)),
        }
    }

    /// Create a client from the `[imagen]` settings.
    ///
    /// # Errors
    ///
    /// Fails when no project or access token is configured.
    pub fn from_settings(settings: &ImagenSettings, tier: Option<TierConfig>) -> StorygenResult<Self> {
        let project = settings
            .project
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ImagenError::new(ImagenErrorKind::MissingProject))?;
        let access_token = settings
            .access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ImagenError::new(ImagenErrorKind::MissingAccessToken))?;

        let tier = tier.map(|t| t.for_model(&settings.model));
        let mut client = Self::new(project, &settings.location, &settings.model, access_token, tier)
            .with_retry_policy(RetryPolicy {
                max_retries: settings.max_retries,
                ..RetryPolicy::default()
            });
        if let Some(endpoint) = &settings.endpoint {
            client = client.with_endpoint(endpoint);
        }
        Ok(client)
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &StorygenConfig) -> StorygenResult<Self> {
        Self::from_settings(&config.imagen, config.get_tier("imagen", None))
    }

    /// Point the client at another base URL (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.limiter = self.limiter.with_retry_policy(retry);
        self
    }

    /// Full `predict` URL for a model.
    pub fn predict_url(&self, model: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.endpoint, self.project, self.location, model
        )
    }

    fn request_body(req: &ImageRequest) -> PredictRequest {
        PredictRequest {
            instances: vec![PredictInstance {
                prompt: req.prompt().clone(),
            }],
            parameters: PredictParameters {
                sample_count: *req.number_of_images(),
                negative_prompt: req.negative_prompt().clone(),
                aspect_ratio: req.aspect_ratio().to_string(),
            },
        }
    }

    async fn predict(&self, url: &str, body: &PredictRequest) -> ImagenResult<PredictResponse> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| ImagenError::new(ImagenErrorKind::Request(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ImagenError::new(ImagenErrorKind::HttpError {
                status_code: status.as_u16(),
                message,
            }));
        }

        response
            .json::<PredictResponse>()
            .await
            .map_err(|e| ImagenError::new(ImagenErrorKind::MalformedResponse(e.to_string())))
    }

    fn decode(response: PredictResponse) -> ImagenResult<Vec<GeneratedImage>> {
        let mut images = Vec::with_capacity(response.predictions.len());

        for prediction in response.predictions {
            let Some(encoded) = prediction.bytes_base64_encoded else {
                warn!(
                    reason = prediction.rai_filtered_reason.as_deref().unwrap_or("unknown"),
                    "Prediction carried no image"
                );
                continue;
            };

            let data = STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| ImagenError::new(ImagenErrorKind::Base64Decode(e.to_string())))?;
            let mime_type = prediction
                .mime_type
                .unwrap_or_else(|| "image/png".to_string());

            images.push(GeneratedImage::new(data, mime_type));
        }

        Ok(images)
    }

    async fn generate_internal(&self, req: &ImageRequest) -> ImagenResult<Vec<GeneratedImage>> {
        let model = req.model().as_deref().unwrap_or(&self.model);
        let url = self.predict_url(model);
        let body = Self::request_body(req);

        let (url, body) = (url.as_str(), &body);
        let response = self
            .limiter
            .execute(1, move || self.predict(url, body))
            .await?;

        let images = Self::decode(response)?;
        info!(model, images = images.len(), "Imagen returned images");
        Ok(images)
    }
}

#[async_trait]
impl ImageGenerator for ImagenClient {
    #[instrument(skip(self, req), fields(model = req.model().as_deref().unwrap_or(&self.model), count = *req.number_of_images()))]
    async fn generate_images(&self, req: &ImageRequest) -> StorygenResult<Vec<GeneratedImage>> {
        debug!(prompt = %req.prompt(), "Requesting images");
        self.generate_internal(req).await.map_err(Into::into)
    }

    fn provider_name(&self) -> &'static str {
        "vertex-imagen"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
