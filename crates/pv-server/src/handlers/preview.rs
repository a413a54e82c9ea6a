//! Preview page endpoint.
//!
//! Serves the rendered preview file, optionally with the update-check script
//! that reloads the page when a newer build lands.

use std::io::ErrorKind;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;

use crate::error::ServerError;
use crate::state::AppState;

/// Script polling the state endpoint and reloading the page on a newer build.
const RELOAD_SCRIPT: &str = include_str!("../assets/check_preview_updates.js");

/// Handle GET / and GET /preview.
pub(crate) async fn get_preview(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ServerError> {
    let contents = tokio::fs::read_to_string(&state.preview_file)
        .await
        .map_err(|e| {
            tracing::error!(
                path = %state.preview_file.display(),
                error = %e,
                "Failed to read preview file"
            );
            if e.kind() == ErrorKind::NotFound {
                ServerError::PreviewNotFound(state.preview_file.clone())
            } else {
                ServerError::Io(e)
            }
        })?;

    tracing::debug!(
        path = %state.preview_file.display(),
        inject_reload_script = state.inject_reload_script,
        "Serving preview"
    );

    if state.inject_reload_script {
        Ok(Html(with_reload_script(&contents)))
    } else {
        Ok(Html(contents))
    }
}

/// Insert the reload script before the closing `</body>` tag.
///
/// Pages without a body close tag get the script appended.
fn with_reload_script(html: &str) -> String {
    let tag = format!("<script>\n{RELOAD_SCRIPT}</script>\n");
    let mut out = String::with_capacity(html.len() + tag.len());

    match html.to_ascii_lowercase().rfind("</body") {
        Some(pos) => {
            out.push_str(&html[..pos]);
            out.push_str(&tag);
            out.push_str(&html[pos..]);
        }
        None => {
            out.push_str(html);
            if !html.is_empty() && !html.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&tag);
        }
    }

    out
}
