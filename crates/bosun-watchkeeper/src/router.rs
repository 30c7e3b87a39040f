//! Axum router construction for the watch keeper.
//!
//! Assembles the status page and the `/api/` dispatcher into a single
//! [`Router`] with CORS, request tracing and panic recovery.

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{any, get};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::error_response;
use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `/api/` and `/api/{*method}` -- method-name dispatch
///
/// CORS allows any origin so browser overlays on other ports can read
/// the API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // REST API
        .route("/api", any(handlers::dispatch))
        .route("/api/", any(handlers::dispatch))
        .route("/api/{*method}", any(handlers::dispatch))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Turn a handler panic into the JSON error envelope.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("handler panicked");
    tracing::error!(message, "API handler panicked");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("panic:{message}"))
}
