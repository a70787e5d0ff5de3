//! Core data types for storygen.
//!
//! Provider-neutral request and response types shared by the text and image
//! model clients.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod image;
mod input;
mod message;
mod output;
mod request;
mod role;

pub use image::{
    AspectRatio, GeneratedImage, ImageRequest, ImageRequestBuilder, ImageRequestBuilderError,
};
pub use input::Input;
pub use message::Message;
pub use output::Output;
pub use request::{
    GenerateRequest, GenerateRequestBuilder, GenerateRequestBuilderError, GenerateResponse,
};
pub use role::Role;
