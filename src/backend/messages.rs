use axum::{debug_handler, extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    guestbook::validate,
    threads::{MAX_CONTENT_CHARS, MAX_NAME_CHARS},
    AppState, ValidationError,
};

use super::{files, mirror::storage_failed};

/// Entry in the shared `messages.json`. Timestamps are RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendMessage {
    pub name: String,
    pub content: String,
    pub time: String,
    pub id: i64,
}

#[derive(Deserialize)]
pub(crate) struct NewMessage {
    name: Option<String>,
    content: Option<String>,
}

/// Both fields are required here, unlike the guestbook form. Limits apply to
/// the text as sent, before trimming.
pub fn validate_new_message(name: Option<&str>, content: Option<&str>) -> Result<(String, String), ValidationError> {
    let (Some(name), Some(content)) = (name, content) else {
        return Err(ValidationError::MissingName);
    };
    if name.trim().is_empty() || content.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::NameTooLong);
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ValidationError::ContentTooLong);
    }
    validate(name, content)
}

pub fn sort_newest_first(messages: &mut [BackendMessage]) {
    messages.sort_by_key(|msg| {
        std::cmp::Reverse(OffsetDateTime::parse(&msg.time, &Rfc3339).ok())
    });
}

#[debug_handler]
pub(crate) async fn list(State(app): State<AppState>) -> Json<Vec<BackendMessage>> {
    let mut messages: Vec<BackendMessage> = files::read_or_default(&app.config.messages_file()).await;
    sort_newest_first(&mut messages);
    Json(messages)
}

#[debug_handler]
pub(crate) async fn create(
    State(app): State<AppState>,
    Json(NewMessage { name, content }): Json<NewMessage>,
) -> Response {
    let (name, content) = match validate_new_message(name.as_deref(), content.as_deref()) {
        Ok(fields) => fields,
        Err(err) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() }))).into_response();
        }
    };

    let message = BackendMessage {
        name,
        content,
        time: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        id: app.ids.next_id(),
    };

    let path = app.config.messages_file();
    let _guard = app.file_lock.lock().await;
    let mut messages: Vec<BackendMessage> = files::read_or_default(&path).await;
    messages.push(message.clone());

    if let Err(err) = files::write_pretty(&path, &messages).await {
        tracing::error!("saving message failed: {:#}", err.0);
        return storage_failed();
    }

    let preview: String = message.content.chars().take(20).collect();
    tracing::info!(name = %message.name, "message saved: {preview}");
    Json(json!({ "success": true, "message": message })).into_response()
}
