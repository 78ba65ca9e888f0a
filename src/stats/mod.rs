mod data;
mod recorder;
mod routes;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use data::{export, import, reset_all, ExportBundle, EXPORT_VERSION};
pub use recorder::{format_number, MirroredStats, SessionStats, Stats, StatsRecorder, StatusBoard};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(routes::stats))
        .route("/stats/scan", post(routes::record_scan))
        .route("/stats/session", post(routes::record_session))
        .route("/data/export", get(routes::export_data))
        .route("/data/import", post(routes::import_data))
        .route("/data/reset", post(routes::reset_data))
}
