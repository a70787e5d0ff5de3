//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the storygen binary.

mod commands;
mod generate;
mod image;
mod serve;

pub use commands::{Cli, Commands};
pub use generate::run_generate;
pub use image::run_image;
pub use serve::run_serve;
