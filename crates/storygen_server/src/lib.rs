//! Web server for storygen.
//!
//! Serves the story pipeline over a websocket at `/ws/{user_id}`, a health
//! check at `/health`, generated media under `/media`, and the frontend
//! build as a fallback.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cors;
mod routes;
mod server;
mod state;
mod ws;

pub use cors::{build_cors_layer, origin_allowed};
pub use routes::{HEALTH_SERVICE, health_check};
pub use server::{DEFAULT_STATIC_DIR, StoryServer};
pub use state::AppState;
pub use ws::{NOT_INITIALIZED_MESSAGE, ws_handler};
