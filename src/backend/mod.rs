mod files;
mod messages;
mod mirror;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::AppState;

pub use messages::{sort_newest_first, validate_new_message, BackendMessage};

/// Serialises read-modify-write cycles on the backend's JSON files.
#[derive(Clone, Default, Debug)]
pub struct FileLock(Arc<tokio::sync::Mutex<()>>);

impl FileLock {
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", get(messages::list).post(messages::create))
        .route("/api/save-messages", post(mirror::save_messages))
        .route("/api/save-stats", post(mirror::save_stats))
        .layer(CorsLayer::permissive())
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "requested resource not found" })),
    )
}
