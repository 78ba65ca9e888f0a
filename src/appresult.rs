use axum::{http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}\n\n{}", self.0, self.0.backtrace()),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Input problems reported back to the visitor. Nothing is mutated when one is raised.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please write something before posting")]
    EmptyContent,
    #[error("please fill in both a nickname and a message")]
    MissingName,
    #[error("nickname can't be longer than {max} characters", max = crate::threads::MAX_NAME_CHARS)]
    NameTooLong,
    #[error("message can't be longer than {max} characters", max = crate::threads::MAX_CONTENT_CHARS)]
    ContentTooLong,
    #[error("that file is not a guestbook export (missing version or stats)")]
    UnrecognisedExport,
}
