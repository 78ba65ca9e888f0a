use axum::{debug_handler, extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::{json, Value};

use crate::{stats::MirroredStats, threads::normalize_messages, AppState};

use super::files;

/// Takes a whole message array from a client and replaces the stored copy.
#[debug_handler]
pub(crate) async fn save_messages(
    State(app): State<AppState>,
    Json(values): Json<Vec<Value>>,
) -> Response {
    let messages = normalize_messages(values);

    let _guard = app.file_lock.lock().await;
    match files::write_pretty(&app.config.mirror_file(), &messages).await {
        Ok(()) => {
            tracing::debug!(count = messages.len(), "mirror snapshot saved");
            Json(json!({ "success": true, "count": messages.len() })).into_response()
        }
        Err(err) => {
            tracing::error!("saving mirror snapshot failed: {:#}", err.0);
            storage_failed()
        }
    }
}

#[debug_handler]
pub(crate) async fn save_stats(
    State(app): State<AppState>,
    Json(stats): Json<MirroredStats>,
) -> Response {
    let _guard = app.file_lock.lock().await;
    match files::write_pretty(&app.config.stats_file(), &stats).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(err) => {
            tracing::error!("saving stats snapshot failed: {:#}", err.0);
            storage_failed()
        }
    }
}

pub(super) fn storage_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "saving failed, please try again later" })),
    ).into_response()
}
