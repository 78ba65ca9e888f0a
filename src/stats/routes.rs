use axum::{
    debug_handler,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;

use crate::{guestbook::Confirmation, session, threads::ThreadStore, AppResult, AppState};

use super::{data, ExportBundle, SessionStats, Stats, StatsRecorder, StatusBoard};

#[derive(Serialize)]
pub(crate) struct StatsResponse {
    stats: Stats,
    board: StatusBoard,
}

#[derive(Deserialize)]
pub(crate) struct ScanBody {
    #[serde(default)]
    success: bool,
}

#[derive(Deserialize)]
pub(crate) struct ConfirmQuery {
    confirm: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ResetForm {
    confirm: Option<String>,
    confirm_again: Option<String>,
}

async fn recorder(app: &AppState, session: &Session) -> AppResult<StatsRecorder> {
    let storage = session::client_storage(session, &app.db_pool, &app.client_locks).await?;
    StatsRecorder::load(ThreadStore::new(storage, app.mirror.clone())).await
}

fn snapshot(recorder: &StatsRecorder) -> Json<StatsResponse> {
    Json(StatsResponse {
        stats: recorder.stats.clone(),
        board: recorder.status_board(),
    })
}

#[debug_handler]
pub(crate) async fn stats(State(app): State<AppState>, session: Session) -> AppResult<Json<StatsResponse>> {
    Ok(snapshot(&recorder(&app, &session).await?))
}

/// Called by the scanner page after each decode attempt that produced a code.
#[debug_handler]
pub(crate) async fn record_scan(
    State(app): State<AppState>,
    session: Session,
    Json(ScanBody { success }): Json<ScanBody>,
) -> AppResult<Json<StatsResponse>> {
    let mut recorder = recorder(&app, &session).await?;
    if success {
        recorder.increment_success().await?;
    } else {
        recorder.increment_scan().await?;
    }
    Ok(snapshot(&recorder))
}

#[debug_handler]
pub(crate) async fn record_session(
    State(app): State<AppState>,
    session: Session,
    Json(session_stats): Json<SessionStats>,
) -> AppResult<Json<StatsResponse>> {
    let mut recorder = recorder(&app, &session).await?;
    recorder.update_session(session_stats).await?;
    Ok(snapshot(&recorder))
}

#[debug_handler]
pub(crate) async fn export_data(State(app): State<AppState>, session: Session) -> AppResult<Response> {
    let recorder = recorder(&app, &session).await?;
    let bundle = data::export(&recorder).await?;

    let day = bundle
        .export_date
        .as_deref()
        .and_then(|date| date.split('T').next())
        .unwrap_or("export")
        .to_owned();
    let body = serde_json::to_string_pretty(&bundle)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_owned()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"book-planet-data-{day}.json\"")),
        ],
        body,
    ).into_response())
}

#[debug_handler]
pub(crate) async fn import_data(
    State(app): State<AppState>,
    session: Session,
    Query(ConfirmQuery { confirm }): Query<ConfirmQuery>,
    Json(bundle): Json<ExportBundle>,
) -> AppResult<Response> {
    let mut recorder = recorder(&app, &session).await?;
    let confirmation = Confirmation::from_answer(confirm.as_deref());

    match data::import(&mut recorder, bundle, confirmation).await? {
        Ok(imported) => Ok(Json(json!({ "success": imported })).into_response()),
        Err(err) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        ).into_response()),
    }
}

#[debug_handler]
pub(crate) async fn reset_data(
    State(app): State<AppState>,
    session: Session,
    Form(ResetForm { confirm, confirm_again }): Form<ResetForm>,
) -> AppResult<Redirect> {
    let mut recorder = recorder(&app, &session).await?;
    data::reset_all(
        &mut recorder,
        Confirmation::from_answer(confirm.as_deref()),
        Confirmation::from_answer(confirm_again.as_deref()),
    ).await?;
    Ok(Redirect::to("/"))
}
