//! Error types for the REST boundary.
//!
//! [`WatchKeeperError`] converts into an Axum response carrying a JSON
//! envelope `{"error": "..."}`. Server-side failures are reported as
//! `<kind>:<message>` where the kind is a coarse label, never a Rust
//! type name.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bosun_core::DirectoryError;

/// Message returned for unknown API methods.
pub const NO_SUCH_METHOD: &str = "No such method";

/// Errors that can occur while answering an API request.
#[derive(Debug, thiserror::Error)]
pub enum WatchKeeperError {
    /// The requested API method does not exist.
    #[error("{NO_SUCH_METHOD}")]
    NoSuchMethod,

    /// The system directory could not be reached.
    #[error("{0}")]
    Directory(#[from] DirectoryError),
}

impl WatchKeeperError {
    /// Coarse failure category used in 500 responses.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoSuchMethod => "routing",
            Self::Directory(_) => "directory",
        }
    }

    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoSuchMethod => StatusCode::NOT_FOUND,
            Self::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Build the JSON error envelope.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, axum::Json(body)).into_response()
}

impl IntoResponse for WatchKeeperError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::NOT_FOUND {
            return error_response(status, NO_SUCH_METHOD);
        }
        tracing::warn!(kind = self.kind(), error = %self, "API handler failed");
        error_response(status, &format!("{}:{self}", self.kind()))
    }
}
