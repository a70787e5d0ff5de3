//! Test utilities for story pipeline tests.
//!
//! Mock story models, image generators, and storage backends.

pub mod mock_driver;
pub mod mock_images;
pub mod mock_storage;

#[allow(unused_imports)]
pub use mock_driver::{MockBehavior, MockResponse, MockStoryDriver, sample_story_json};
#[allow(unused_imports)]
pub use mock_images::{MockImageGenerator, PNG_BYTES};
#[allow(unused_imports)]
pub use mock_storage::{FailingStorage, MemoryStorage};
