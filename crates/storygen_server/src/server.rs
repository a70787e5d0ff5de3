//! Router assembly and the listening loop.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use storygen_error::{ServerError, ServerErrorKind, StorygenResult};
use storygen_rate_limit::ServerSettings;
use storygen_story::StoryPipeline;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::{AppState, build_cors_layer, health_check, ws_handler};

/// Frontend build directory used when none is configured.
pub const DEFAULT_STATIC_DIR: &str = "../frontend/out";

/// The storygen web server.
///
/// # Examples
///
/// ```no_run
/// use storygen_rate_limit::ServerSettings;
/// use storygen_server::StoryServer;
///
/// # async fn example() -> storygen_error::StorygenResult<()> {
/// StoryServer::new(ServerSettings::default()).serve().await
/// # }
/// ```
#[derive(Debug)]
pub struct StoryServer {
    settings: ServerSettings,
    pipeline: Option<Arc<StoryPipeline>>,
    media_dir: Option<PathBuf>,
}

impl StoryServer {
    /// Server without a pipeline; story requests are answered with an error.
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            settings,
            pipeline: None,
            media_dir: None,
        }
    }

    /// Serve story requests with `pipeline`.
    pub fn with_pipeline(mut self, pipeline: Arc<StoryPipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Serve files under `dir` at `/media`.
    pub fn with_media_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.media_dir = Some(dir.into());
        self
    }

    /// `host:port` the server binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.settings.host, self.settings.port)
    }

    /// Build the application router.
    ///
    /// # Errors
    ///
    /// Fails when the CORS settings are invalid.
    pub fn router(&self) -> StorygenResult<Router> {
        let mut router = Router::new()
            .route("/health", get(health_check))
            .route("/ws/{user_id}", get(ws_handler));

        if let Some(dir) = &self.media_dir {
            debug!(dir = %dir.display(), "Serving media directory");
            router = router.nest_service("/media", ServeDir::new(dir));
        }

        let static_dir = self
            .settings
            .static_dir
            .as_deref()
            .unwrap_or(DEFAULT_STATIC_DIR);
        if Path::new(static_dir).is_dir() {
            info!(dir = static_dir, "Serving frontend build");
            router = router.fallback_service(
                ServeDir::new(static_dir).append_index_html_on_directories(true),
            );
        } else {
            warn!(
                dir = static_dir,
                "Frontend build not found; set STATIC_FILES_DIR or server.static_dir"
            );
        }

        Ok(router
            .layer(TraceLayer::new_for_http())
            .layer(build_cors_layer(&self.settings)?)
            .with_state(AppState::new(self.pipeline.clone())))
    }

    /// Bind the configured address and serve until Ctrl-C or SIGTERM.
    pub async fn serve(self) -> StorygenResult<()> {
        let address = self.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            ServerError::new(ServerErrorKind::Bind {
                address: address.clone(),
                message: e.to_string(),
            })
        })?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> StorygenResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router()?;
        if let Ok(address) = listener.local_addr() {
            info!(%address, pipeline = self.pipeline.is_some(), "Server listening");
        }

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::new(ServerErrorKind::Serve(e.to_string())).into())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
