//! Console logging for the storygen binary.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
///
/// `verbose` raises the storygen crates to `debug`.
pub fn default_filter(verbose: bool) -> String {
    if verbose {
        "info,storygen=debug,storygen_story=debug,storygen_models=debug,storygen_server=debug"
            .to_string()
    } else {
        "info".to_string()
    }
}

/// Initialize console-only telemetry.
///
/// `RUST_LOG` takes precedence over `default_filter`. With `json_logs`
/// every event is written as one JSON object per line.
pub fn init_console_telemetry(
    default_filter: &str,
    json_logs: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
