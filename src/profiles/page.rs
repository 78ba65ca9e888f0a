use axum::{debug_handler, extract::State, response::{Html, IntoResponse, Response}};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tower_sessions::Session;

use crate::{include_res, res::escape_html, session, storage::ClientLocks, AppResult, AppState, Config};

use super::get_or_create_profile;

#[debug_handler(state = AppState)]
pub(crate) async fn profile(
    State(db_pool): State<SqlitePool>,
    State(config): State<std::sync::Arc<Config>>,
    State(locks): State<ClientLocks>,
    session: Session,
) -> AppResult<Response> {
    let storage = session::client_storage(&session, &db_pool, &locks).await?;
    let profile = get_or_create_profile(&storage).await?;

    let since = OffsetDateTime::from_unix_timestamp_nanos(profile.created_at as i128 * 1_000_000)
        .map(|at| crate::threads::display_time(at, config.display_offset))
        .unwrap_or_default();

    Ok(Html(
        include_res!(str, "/pages/profiles/profile.html")
            .replace("{avatar_color}", &escape_html(&profile.avatar.color))
            .replace("{avatar_char}", &escape_html(&profile.avatar.letter))
            .replace("{since}", &escape_html(&since))
            .replace("{nickname}", &escape_html(&profile.nickname))
    ).into_response())
}
