//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use storygen::AspectRatio;

/// storygen - illustrated children's stories from a handful of keywords
#[derive(Parser, Debug)]
#[command(name = "storygen")]
#[command(about = "Generate illustrated four-scene children's stories", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file layered over the defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP and websocket server
    Serve {
        /// Bind address (overrides `server.host`)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides `server.port`)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Generate a story and its illustrations, printing JSON lines
    Generate {
        /// Comma-separated story keywords
        #[arg(short, long)]
        keywords: String,

        /// User id the sessions are created for
        #[arg(long, default_value = "cli")]
        user_id: String,
    },

    /// Generate images for a single prompt and print the tool result
    Image {
        /// Image description
        #[arg(short, long)]
        prompt: String,

        /// Aspect ratio, e.g. 16:9
        #[arg(long)]
        aspect_ratio: Option<AspectRatio>,

        /// Number of images to generate
        #[arg(long)]
        count: Option<u32>,

        /// Content the model should avoid
        #[arg(long)]
        negative_prompt: Option<String>,
    },

    /// Print the story instruction template
    Prompt,
}
