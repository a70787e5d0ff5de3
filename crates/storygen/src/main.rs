//! storygen CLI binary.
//!
//! This binary provides command-line access to storygen:
//! - Serve the websocket backend for the story frontend
//! - Generate a story with illustrations from the terminal
//! - Generate a single image, or print the story prompt

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, run_generate, run_image, run_serve};

    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let filter = storygen::telemetry::default_filter(cli.verbose);

    #[cfg(feature = "observability")]
    let _provider = storygen::observability::init_observability(
        storygen::observability::ObservabilityConfig::default()
            .with_log_level(filter)
            .with_json_logs(cli.json_logs),
    )?;

    #[cfg(not(feature = "observability"))]
    storygen::telemetry::init_console_telemetry(&filter, cli.json_logs)?;

    let config = storygen::StorygenConfig::load(cli.config.as_deref())?;

    // Execute the requested command
    match cli.command {
        Commands::Serve { host, port } => {
            run_serve(config, host, port).await?;
        }

        Commands::Generate { keywords, user_id } => {
            run_generate(&config, &keywords, &user_id).await?;
        }

        Commands::Image {
            prompt,
            aspect_ratio,
            count,
            negative_prompt,
        } => {
            run_image(&config, &prompt, aspect_ratio, count, negative_prompt).await?;
        }

        Commands::Prompt => {
            println!("{}", storygen::STORY_INSTRUCTIONS);
        }
    }

    Ok(())
}
