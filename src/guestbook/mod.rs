mod actions;
mod controller;
mod page;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use controller::{validate, Alert, Confirmation, Guestbook, GuestbookState, Outcome};
pub use page::render_page;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(actions::index))
        .route("/g/show", post(actions::show))
        .route("/g/hide", post(actions::hide))
        .route("/g/toggle", post(actions::toggle))
        .route("/g/messages", post(actions::submit_message))
        .route("/g/messages/{id}/replies", post(actions::submit_reply))
        .route("/g/messages/{id}/reply-form", post(actions::toggle_reply_form))
        .route("/g/clear", post(actions::clear))
}
