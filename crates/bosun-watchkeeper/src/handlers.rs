//! HTTP handlers for the watch keeper.
//!
//! `/api/<method>` requests all land in [`dispatch`], which picks the
//! [`RestAction`] from the shared table and runs it. Both actions answer
//! with the same [`SystemReport`] shape.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::Uri;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use tracing::debug;

use crate::dispatch::RestAction;
use crate::error::WatchKeeperError;
use crate::state::AppState;

/// Body of `/api/system` and `/api/poll`.
///
/// Fields are omitted when unknown; with no system yet the body is `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemReport {
    /// Current system name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systemname: Option<String>,
    /// Directory id, as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eddbid: Option<String>,
    /// Directory page URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eddburl: Option<String>,
}

/// `ANY /api/{*method}` -- route to the named action.
pub async fn dispatch(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let Some(action) = state.routes.resolve(uri.path()) else {
        debug!(path = uri.path(), "Unknown API method");
        return WatchKeeperError::NoSuchMethod.into_response();
    };

    let result = match action {
        RestAction::System => current_system(&state).await,
        RestAction::Poll => poll_system(&state).await,
    };

    match result {
        Ok(report) => Json(report).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Report the current system, resolving its id once.
///
/// # Errors
///
/// Returns [`WatchKeeperError::Directory`] if the directory lookup fails.
pub async fn current_system(state: &AppState) -> Result<SystemReport, WatchKeeperError> {
    let Some(name) = state.mate.last_system_name().await else {
        return Ok(SystemReport::default());
    };

    let resolved = state.mate.resolve_system(&name).await?;
    Ok(SystemReport {
        eddbid: resolved.as_ref().map(|r| r.eddb_id.to_string()),
        eddburl: resolved.map(|r| r.eddb_url),
        systemname: Some(name),
    })
}

/// Wait until the current system name changes, then report it.
///
/// The generation is captured before the name so that an arrival landing
/// between the two is still seen. Wakes that leave the name unchanged
/// (commander, docking, or a repeat arrival) keep waiting. With a
/// configured timeout the current state is reported when it expires;
/// a server shutdown likewise releases the poll with the current state.
///
/// # Errors
///
/// Returns [`WatchKeeperError::Directory`] if the final lookup fails.
pub async fn poll_system(state: &AppState) -> Result<SystemReport, WatchKeeperError> {
    let mate = &state.mate;
    let mut seen = mate.signal().generation();
    let before = mate.last_system_name().await;

    let changed = async {
        loop {
            seen = mate.signal().wait_past(seen).await;
            if mate.last_system_name().await != before {
                break;
            }
        }
    };

    let bounded = async {
        match state.long_poll_timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, changed).await.is_err() {
                    debug!(timeout_ms = limit.as_millis(), "Long poll timed out");
                }
            }
            None => changed.await,
        }
    };

    tokio::select! {
        () = bounded => {}
        () = state.shutdown_requested() => debug!("Long poll released by shutdown"),
    }

    current_system(state).await
}

/// `GET /` -- minimal HTML status page.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let player = state.mate.player().await;
    let commander = escape_html(player.commander.as_deref().unwrap_or("unknown"));
    let system = escape_html(player.last_system_name().unwrap_or("unknown"));
    let docking = if player.recently_near_station {
        "granted"
    } else {
        "none"
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Bosun</title>
    <style>
        body {{ font-family: 'Consolas', monospace; padding: 2rem; max-width: 640px; margin: 0 auto; }}
        dt {{ font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Bosun</h1>
    <dl>
        <dt>Commander</dt><dd>{commander}</dd>
        <dt>System</dt><dd>{system}</dd>
        <dt>Docking</dt><dd>{docking}</dd>
    </dl>
    <p><a href="/api/system">/api/system</a> | <a href="/api/poll">/api/poll</a></p>
</body>
</html>"#
    ))
}

/// Escape text for an HTML element body.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_text_is_escaped_for_html() {
        assert_eq!(
            escape_html("<b>Jameson</b> & co"),
            "&lt;b&gt;Jameson&lt;/b&gt; &amp; co"
        );
        assert_eq!(escape_html("Sol"), "Sol");
    }

    #[test]
    fn empty_report_serializes_to_empty_object() {
        let body = serde_json::to_string(&SystemReport::default()).unwrap_or_default();
        assert_eq!(body, "{}");
    }

    #[test]
    fn unresolved_report_carries_name_only() {
        let report = SystemReport {
            systemname: Some(String::from("Sol")),
            ..SystemReport::default()
        };
        let body = serde_json::to_value(&report).unwrap_or_default();
        assert_eq!(body, serde_json::json!({ "systemname": "Sol" }));
    }
}
