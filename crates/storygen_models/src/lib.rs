//! Hosted model clients for storygen.
//!
//! # Available Providers
//!
//! - **Gemini** (story text) - enable with the `gemini` feature
//! - **Imagen** on Vertex AI (illustrations) - enable with the `imagen` feature
//!
//! Both clients wrap every remote call in a [`storygen_rate_limit::RateLimiter`]
//! configured from the `providers` section of `storygen.toml`.
//!
//! ```no_run
//! # #[cfg(feature = "gemini")]
//! # {
//! use storygen_models::GeminiClient;
//! use storygen_interface::StorygenDriver;
//! use storygen_core::{GenerateRequest, Message};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::from_env("gemini-2.5-flash", None)?;
//! let request = GenerateRequest {
//!     messages: vec![Message::user("Hello")],
//!     ..Default::default()
//! };
//! let response = client.generate(&request).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "imagen")]
mod imagen;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiClient, GeminiResult, TieredGemini};

#[cfg(feature = "imagen")]
pub use imagen::{ImagenClient, ImagenResult};
