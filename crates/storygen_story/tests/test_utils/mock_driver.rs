//! Mock story model.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use storygen_core::{GenerateRequest, GenerateResponse, Output};
use storygen_error::{GeminiError, GeminiErrorKind, StorygenError, StorygenResult};
use storygen_interface::StorygenDriver;

/// Behavior configuration for mock responses.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockBehavior {
    /// Always return success with the given text
    Success(String),
    /// Always return the specified error
    Error(GeminiErrorKind),
    /// Return a sequence of responses (errors or success)
    Sequence(Vec<MockResponse>),
}

/// A single mock response.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockResponse {
    Success(String),
    Error(GeminiErrorKind),
}

/// Mock story model that records the requests it receives.
pub struct MockStoryDriver {
    behavior: MockBehavior,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

#[allow(dead_code)]
impl MockStoryDriver {
    pub fn new_success(text: impl Into<String>) -> Self {
        Self::new_with_behavior(MockBehavior::Success(text.into()))
    }

    pub fn new_error(error: GeminiErrorKind) -> Self {
        Self::new_with_behavior(MockBehavior::Error(error))
    }

    pub fn new_sequence(responses: Vec<MockResponse>) -> Self {
        Self::new_with_behavior(MockBehavior::Sequence(responses))
    }

    pub fn new_with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(response: &MockResponse) -> StorygenResult<GenerateResponse> {
        match response {
            MockResponse::Success(text) => Ok(GenerateResponse {
                outputs: vec![Output::Text(text.clone())],
            }),
            MockResponse::Error(kind) => Err(StorygenError::from(GeminiError::new(kind.clone()))),
        }
    }
}

#[async_trait]
impl StorygenDriver for MockStoryDriver {
    async fn generate(&self, req: &GenerateRequest) -> StorygenResult<GenerateResponse> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(req.clone());
            requests.len() - 1
        };

        match &self.behavior {
            MockBehavior::Success(text) => Self::respond(&MockResponse::Success(text.clone())),
            MockBehavior::Error(kind) => Self::respond(&MockResponse::Error(kind.clone())),
            MockBehavior::Sequence(responses) => match responses.get(call) {
                Some(response) => Self::respond(response),
                None => Err(StorygenError::from(GeminiError::new(GeminiErrorKind::ApiRequest(
                    format!("Mock sequence exhausted (call {})", call + 1),
                )))),
            },
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock-gemini"
    }

    fn model_name(&self) -> &str {
        "mock-story-model"
    }
}

/// A valid story as the model would return it, wrapped in a code fence.
pub fn sample_story_json() -> String {
    r#"Here is your story!

```json
{
  "story": "Pip the frog found a lantern. The lantern flickered out. Pip climbed the old oak to relight it. The forest glowed again.",
  "main_characters": [
    {"name": "Pip", "description": "a small green frog with a yellow scarf"},
    {"name": "Lumi", "description": "a glowing paper lantern shaped like a moon"}
  ],
  "scenes": [
    {"index": 1, "title": "The Setup", "description": "A mossy forest clearing at dusk", "text": "Pip the frog found a lantern."},
    {"index": 2, "title": "The Inciting Incident", "description": "A sudden gust of wind in the dark clearing", "text": "The lantern flickered out."},
    {"index": 3, "title": "The Climax", "description": "The top branch of a huge oak tree", "text": "Pip climbed the old oak to relight it."},
    {"index": 4, "title": "The Resolution", "description": "The whole forest lit by warm light", "text": "The forest glowed again."}
  ]
}
```"#
        .to_string()
}
