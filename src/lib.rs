pub mod appresult;
pub mod backend;
pub mod config;
pub mod db;
pub mod guestbook;
pub mod logging;
pub mod profiles;
pub mod res;
pub mod session;
pub mod stats;
pub mod storage;
pub mod threads;

use std::sync::Arc;

use axum::{extract::FromRef, Router};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppResult, ValidationError};
pub use config::Config;

use backend::FileLock;
use storage::ClientLocks;
use threads::{IdClock, Mirror};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub mirror: Mirror,
    pub config: Arc<Config>,
    pub ids: Arc<IdClock>,
    pub file_lock: FileLock,
    pub client_locks: ClientLocks,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> AppResult<AppState> {
        let mirror = Mirror::new(config.mirror_base_url.clone())?;
        Ok(AppState {
            db_pool,
            mirror,
            config: Arc::new(config),
            ids: Arc::new(IdClock::default()),
            file_lock: FileLock::default(),
            client_locks: ClientLocks::default(),
        })
    }
}

pub fn app(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(state.config.session_days)));

    Router::new()
        .merge(guestbook::router())
        .nest("/p", profiles::router())
        .merge(stats::router())
        .merge(backend::router())
        .fallback(backend::not_found)
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}
