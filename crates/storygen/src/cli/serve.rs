//! Server command handler.

use std::sync::Arc;

use storygen::{StoryServer, StorygenConfig, StorygenResult, build_pipeline, media_dir};

/// Handle the `serve` command.
///
/// A pipeline that cannot be built (missing credentials) is logged and the
/// server starts anyway; story requests are then answered with an error.
pub async fn run_serve(
    mut config: StorygenConfig,
    host: Option<String>,
    port: Option<u16>,
) -> StorygenResult<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let mut server = StoryServer::new(config.server.clone());

    match build_pipeline(&config) {
        Ok(pipeline) => {
            tracing::info!("Story agents initialized");
            server = server.with_pipeline(Arc::new(pipeline));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Story agents not initialized, story requests will fail");
        }
    }

    if let Some(dir) = media_dir(&config.storage) {
        server = server.with_media_dir(dir);
    }

    tracing::info!(address = %server.address(), "Server starting. Press Ctrl+C to stop.");
    server.serve().await
}
