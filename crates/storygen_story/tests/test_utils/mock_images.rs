//! Mock image model.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use storygen_core::{GeneratedImage, ImageRequest};
use storygen_error::{ImagenError, ImagenErrorKind, StorygenError, StorygenResult};
use storygen_interface::ImageGenerator;

/// PNG signature followed by a few bytes; enough for storage round trips.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

enum Behavior {
    Images(Vec<Vec<u8>>),
    Error(ImagenErrorKind),
    /// Fail on the listed 1-based calls, succeed otherwise
    FailOnCalls(Vec<usize>, ImagenErrorKind),
}

/// Mock image model that records every request.
pub struct MockImageGenerator {
    behavior: Behavior,
    requests: Arc<Mutex<Vec<ImageRequest>>>,
}

#[allow(dead_code)]
impl MockImageGenerator {
    /// Returns one PNG per requested image.
    pub fn new_success() -> Self {
        Self::with_behavior(Behavior::Images(Vec::new()))
    }

    /// Returns exactly these images regardless of the request.
    pub fn new_images(images: Vec<Vec<u8>>) -> Self {
        Self::with_behavior(Behavior::Images(images))
    }

    pub fn new_error(error: ImagenErrorKind) -> Self {
        Self::with_behavior(Behavior::Error(error))
    }

    pub fn new_failing_calls(calls: Vec<usize>, error: ImagenErrorKind) -> Self {
        Self::with_behavior(Behavior::FailOnCalls(calls, error))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn pngs(req: &ImageRequest) -> Vec<GeneratedImage> {
        (0..*req.number_of_images())
            .map(|_| GeneratedImage::png(PNG_BYTES.to_vec()))
            .collect()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate_images(&self, req: &ImageRequest) -> StorygenResult<Vec<GeneratedImage>> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(req.clone());
            requests.len()
        };

        match &self.behavior {
            Behavior::Images(images) if images.is_empty() => Ok(Self::pngs(req)),
            Behavior::Images(images) => Ok(images.iter().cloned().map(GeneratedImage::png).collect()),
            Behavior::Error(kind) => Err(StorygenError::from(ImagenError::new(kind.clone()))),
            Behavior::FailOnCalls(calls, kind) if calls.contains(&call) => {
                Err(StorygenError::from(ImagenError::new(kind.clone())))
            }
            Behavior::FailOnCalls(..) => Ok(Self::pngs(req)),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock-imagen"
    }

    fn model_name(&self) -> &str {
        "mock-image-model"
    }
}
