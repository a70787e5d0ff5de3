//! Rate limiting, retry, and configuration.
//!
//! Hosted model quotas are described as tiers in `storygen.toml`. A
//! [`RateLimiter`] enforces a tier's limits around every remote call and
//! retries transient failures with jittered exponential backoff.
//!
//! The same file carries the story, image, storage, and server settings,
//! loaded through [`StorygenConfig::load`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod limiter;
mod settings;
mod tier;

pub use config::{ModelTierConfig, ProviderConfig, StorygenConfig, TierConfig};
pub use limiter::{RateLimiter, RateLimiterGuard, RetryPolicy};
pub use settings::{ImagenSettings, ServerSettings, StorageBackend, StorageSettings, StorySettings};
pub use tier::Tier;
