//! Watch keeper: the JSON REST front end for Bosun.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`GET /api/system`** -- the current system name, EDDB id and URL
//! - **`GET /api/poll`** -- a long poll that answers once the player
//!   enters a different system
//! - **`GET /`** -- a minimal HTML status page
//!
//! # Dispatch
//!
//! Everything under `/api/` goes through one handler that lower-cases
//! the third path segment and looks it up in a [`DispatchTable`] built
//! once at startup. Unknown names get a 404 `{"error": "No such method"}`;
//! handler failures (and panics) get a 500 `{"error": "<kind>:<message>"}`.
//!
//! Each connection is served on its own task, so a pending long poll
//! never holds up other requests.
//!
//! [`DispatchTable`]: dispatch::DispatchTable

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use startup::Watch;
pub use state::AppState;
