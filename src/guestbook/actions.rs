use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    session::{self, GUESTBOOK_STATE},
    stats::StatsRecorder,
    threads::ThreadStore,
    AppResult, AppState,
};

use super::{render_page, Alert, Confirmation, Guestbook, GuestbookState, Outcome};

#[derive(Deserialize)]
pub(crate) struct PostForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
pub(crate) struct ClearForm {
    confirm: Option<String>,
}

async fn open(app: &AppState, session: &Session) -> AppResult<Guestbook> {
    let storage = session::client_storage(session, &app.db_pool, &app.client_locks).await?;
    let state = session
        .get::<GuestbookState>(GUESTBOOK_STATE)
        .await?
        .unwrap_or_default();

    Ok(Guestbook::new(
        ThreadStore::new(storage, app.mirror.clone()),
        app.ids.clone(),
        app.config.display_offset,
        state,
    ))
}

async fn finish(session: &Session, guestbook: Guestbook, outcome: Outcome) -> AppResult<Response> {
    session.insert(GUESTBOOK_STATE, &guestbook.state).await?;

    let mut recorder = StatsRecorder::load(guestbook.store().clone()).await?;
    if outcome.toast.is_some() || matches!(outcome.alert, Some(Alert::Notice(_))) {
        recorder.update_message_count().await?;
    }

    let status = if outcome.is_rejection() { StatusCode::BAD_REQUEST } else { StatusCode::OK };
    let html = render_page(&guestbook, &outcome, &recorder).await;
    Ok((status, Html(html)).into_response())
}

#[debug_handler]
pub(crate) async fn index(State(app): State<AppState>, session: Session) -> AppResult<Response> {
    let guestbook = open(&app, &session).await?;
    StatsRecorder::load(guestbook.store().clone())
        .await?
        .increment_visit()
        .await?;
    finish(&session, guestbook, Outcome::default()).await
}

#[debug_handler]
pub(crate) async fn show(State(app): State<AppState>, session: Session) -> AppResult<Response> {
    let mut guestbook = open(&app, &session).await?;
    let outcome = guestbook.show().await?;
    finish(&session, guestbook, outcome).await
}

#[debug_handler]
pub(crate) async fn hide(State(app): State<AppState>, session: Session) -> AppResult<Response> {
    let mut guestbook = open(&app, &session).await?;
    let outcome = guestbook.hide();
    finish(&session, guestbook, outcome).await
}

#[debug_handler]
pub(crate) async fn toggle(State(app): State<AppState>, session: Session) -> AppResult<Response> {
    let mut guestbook = open(&app, &session).await?;
    let outcome = guestbook.toggle().await?;
    finish(&session, guestbook, outcome).await
}

#[debug_handler]
pub(crate) async fn submit_message(
    State(app): State<AppState>,
    session: Session,
    Form(PostForm { name, content }): Form<PostForm>,
) -> AppResult<Response> {
    let mut guestbook = open(&app, &session).await?;
    let outcome = guestbook.submit_message(&name, &content).await?;
    finish(&session, guestbook, outcome).await
}

#[debug_handler]
pub(crate) async fn submit_reply(
    State(app): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(PostForm { name, content }): Form<PostForm>,
) -> AppResult<Response> {
    let mut guestbook = open(&app, &session).await?;
    let outcome = guestbook.submit_reply(id, &name, &content).await?;
    finish(&session, guestbook, outcome).await
}

#[debug_handler]
pub(crate) async fn toggle_reply_form(
    State(app): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let mut guestbook = open(&app, &session).await?;
    let outcome = guestbook.toggle_reply_form(id).await;
    finish(&session, guestbook, outcome).await
}

#[debug_handler]
pub(crate) async fn clear(
    State(app): State<AppState>,
    session: Session,
    Form(ClearForm { confirm }): Form<ClearForm>,
) -> AppResult<Response> {
    let mut guestbook = open(&app, &session).await?;
    let outcome = guestbook
        .clear_all_messages(Confirmation::from_answer(confirm.as_deref()))
        .await?;
    finish(&session, guestbook, outcome).await
}
