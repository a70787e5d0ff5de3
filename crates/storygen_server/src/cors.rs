//! Cross-origin policy for the frontend.

use std::time::Duration;

use axum::http::HeaderValue;
use axum::http::request::Parts;
use regex::Regex;
use storygen_error::{ServerError, ServerErrorKind, StorygenResult};
use storygen_rate_limit::ServerSettings;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Whether `origin` is listed in `origins` or matches `pattern`.
pub fn origin_allowed(origin: &str, origins: &[String], pattern: Option<&Regex>) -> bool {
    origins.iter().any(|allowed| allowed == origin)
        || pattern.is_some_and(|pattern| pattern.is_match(origin))
}

/// CORS layer allowing the configured origins plus the origin regex.
///
/// Credentials are allowed, so methods and headers mirror the request
/// instead of using wildcards.
///
/// # Errors
///
/// Returns a configuration error when the origin regex does not compile.
pub fn build_cors_layer(settings: &ServerSettings) -> StorygenResult<CorsLayer> {
    let pattern = settings
        .cors_origin_regex
        .as_deref()
        .filter(|pattern| !pattern.trim().is_empty())
        .map(Regex::new)
        .transpose()
        .map_err(|e| {
            ServerError::new(ServerErrorKind::Configuration(format!(
                "invalid cors_origin_regex: {}",
                e
            )))
        })?;
    let origins = settings.cors_origins.clone();

    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
        origin
            .to_str()
            .is_ok_and(|origin| origin_allowed(origin, &origins, pattern.as_ref()))
    });

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600)))
}
