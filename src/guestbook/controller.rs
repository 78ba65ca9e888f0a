use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    profiles::get_or_create_profile,
    threads::{display_time, render_with_open_form, IdClock, Message, Reply, ThreadStore, MAX_CONTENT_CHARS, MAX_NAME_CHARS},
    AppResult, ValidationError,
};

pub const MESSAGE_POSTED: &str = "Message posted!";
pub const REPLY_POSTED: &str = "Reply posted!";
pub const MESSAGES_CLEARED: &str = "All messages have been cleared.";

/// Per-visitor UI state. At most one reply form is open at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestbookState {
    pub visible: bool,
    pub open_reply_form: Option<i64>,
    pub name_draft: String,
    pub content_draft: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    pub fn from_answer(answer: Option<&str>) -> Confirmation {
        match answer {
            Some("yes") | Some("true") | Some("on") => Confirmation::Confirmed,
            _ => Confirmation::Declined,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    Invalid(ValidationError),
    Notice(&'static str),
}

/// What the visitor should see after an action besides the page itself.
/// An open reply form takes focus on its own; `focus_message` puts the cursor
/// back in the main message box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub toast: Option<&'static str>,
    pub alert: Option<Alert>,
    pub focus_message: bool,
}

impl Outcome {
    fn toast(text: &'static str) -> Outcome {
        Outcome { toast: Some(text), ..Outcome::default() }
    }

    fn alert(alert: Alert) -> Outcome {
        Outcome { alert: Some(alert), ..Outcome::default() }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self.alert, Some(Alert::Invalid(_)))
    }
}

/// Trims both fields and checks them. An empty name is allowed here; the
/// caller falls back to the visitor's nickname.
pub fn validate(name: &str, content: &str) -> Result<(String, String), ValidationError> {
    let name = name.trim();
    let content = content.trim();

    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ValidationError::ContentTooLong);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::NameTooLong);
    }

    Ok((name.to_owned(), content.to_owned()))
}

pub struct Guestbook {
    store: ThreadStore,
    ids: Arc<IdClock>,
    offset: UtcOffset,
    pub state: GuestbookState,
}

impl Guestbook {
    pub fn new(store: ThreadStore, ids: Arc<IdClock>, offset: UtcOffset, state: GuestbookState) -> Guestbook {
        Guestbook { store, ids, offset, state }
    }

    pub fn store(&self) -> &ThreadStore {
        &self.store
    }

    pub async fn threads_html(&self) -> String {
        render_with_open_form(&self.store.load_all().await, self.state.open_reply_form)
    }

    pub async fn submit_message(&mut self, name: &str, content: &str) -> AppResult<Outcome> {
        self.state.visible = true;
        let (name, content) = match validate(name, content) {
            Ok(fields) => fields,
            Err(err) => {
                self.state.name_draft = name.to_owned();
                self.state.content_draft = content.to_owned();
                return Ok(Outcome {
                    focus_message: true,
                    ..Outcome::alert(Alert::Invalid(err))
                });
            }
        };

        let name = self.name_or_nickname(name).await?;
        let message = Message::new(self.ids.next_id(), name, content, self.now());
        tracing::info!(client_id = self.store.storage().client_id(), id = message.id, "message posted");

        self.store.append(message).await?;
        self.mirror().await;

        self.state.name_draft.clear();
        self.state.content_draft.clear();
        Ok(Outcome::toast(MESSAGE_POSTED))
    }

    /// Replying to a message that is gone does nothing and says nothing.
    pub async fn submit_reply(&mut self, message_id: i64, name: &str, content: &str) -> AppResult<Outcome> {
        self.state.visible = true;
        let (name, content) = match validate(name, content) {
            Ok(fields) => fields,
            Err(err) => {
                if self.store.contains(message_id).await {
                    self.state.open_reply_form = Some(message_id);
                }
                return Ok(Outcome::alert(Alert::Invalid(err)));
            }
        };

        let name = self.name_or_nickname(name).await?;
        let reply = Reply::new(self.ids.next_id(), name, content, self.now());

        if !self.store.append_reply(message_id, reply).await? {
            tracing::debug!(message_id, "reply target missing, ignoring");
            return Ok(Outcome::default());
        }
        self.mirror().await;

        if self.state.open_reply_form == Some(message_id) {
            self.state.open_reply_form = None;
        }
        Ok(Outcome::toast(REPLY_POSTED))
    }

    /// Opens the form for `message_id` and closes any other, or closes it if
    /// it was already open.
    pub async fn toggle_reply_form(&mut self, message_id: i64) -> Outcome {
        self.state.visible = true;
        if !self.store.contains(message_id).await {
            return Outcome::default();
        }

        if self.state.open_reply_form == Some(message_id) {
            self.state.open_reply_form = None;
            return Outcome::default();
        }

        self.state.open_reply_form = Some(message_id);
        Outcome::default()
    }

    pub async fn show(&mut self) -> AppResult<Outcome> {
        self.state.visible = true;

        let profile = get_or_create_profile(self.store.storage()).await?;
        if self.state.name_draft.is_empty() {
            self.state.name_draft = profile.nickname;
        }
        Ok(Outcome::default())
    }

    pub fn hide(&mut self) -> Outcome {
        self.state.visible = false;
        Outcome::default()
    }

    pub async fn toggle(&mut self) -> AppResult<Outcome> {
        if self.state.visible {
            Ok(self.hide())
        } else {
            self.show().await
        }
    }

    pub async fn clear_all_messages(&mut self, confirmation: Confirmation) -> AppResult<Outcome> {
        self.state.visible = true;
        if confirmation == Confirmation::Declined {
            return Ok(Outcome::default());
        }

        self.store.clear_all().await?;
        self.state.open_reply_form = None;
        tracing::info!(client_id = self.store.storage().client_id(), "messages cleared");
        Ok(Outcome::alert(Alert::Notice(MESSAGES_CLEARED)))
    }

    async fn name_or_nickname(&self, name: String) -> AppResult<String> {
        if !name.is_empty() {
            return Ok(name);
        }
        Ok(get_or_create_profile(self.store.storage()).await?.nickname)
    }

    async fn mirror(&self) {
        let snapshot = self.store.load_all().await;
        // detached; local state is already committed
        let _ = self.store.mirror_remote(&snapshot);
    }

    fn now(&self) -> String {
        display_time(OffsetDateTime::now_utc(), self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    use crate::{
        db,
        profiles::VisitorProfile,
        storage::{ClientStorage, MESSAGES_KEY, PROFILE_KEY},
        threads::{wait_for_calls, Mirror},
    };

    async fn guestbook() -> Guestbook {
        guestbook_mirrored_to(Mirror::disabled()).await
    }

    async fn guestbook_mirrored_to(mirror: Mirror) -> Guestbook {
        let db_pool = db::connect_in_memory().await.unwrap();
        let store = ThreadStore::new(ClientStorage::new(db_pool, "visitor"), mirror);
        Guestbook::new(store, Arc::new(IdClock::default()), UtcOffset::UTC, GuestbookState::default())
    }

    #[test]
    fn validation_trims_and_limits() {
        assert_eq!(validate("  Al ", " hi  "), Ok(("Al".to_owned(), "hi".to_owned())));
        assert_eq!(validate("Al", " \n\t "), Err(ValidationError::EmptyContent));
        assert_eq!(validate(&"n".repeat(51), "hi"), Err(ValidationError::NameTooLong));
        assert_eq!(validate(&"n".repeat(50), "hi").map(|_| ()), Ok(()));
        assert_eq!(validate("", &"c".repeat(501)), Err(ValidationError::ContentTooLong));
        assert_eq!(validate("", &"留".repeat(500)).map(|_| ()), Ok(()));
    }

    #[test]
    fn confirmation_needs_explicit_yes() {
        assert_eq!(Confirmation::from_answer(Some("yes")), Confirmation::Confirmed);
        assert_eq!(Confirmation::from_answer(Some("no")), Confirmation::Declined);
        assert_eq!(Confirmation::from_answer(None), Confirmation::Declined);
    }

    #[tokio::test]
    async fn submit_appends_one_trimmed_message() {
        let mut gb = guestbook().await;
        gb.state.name_draft = "Alice".into();
        gb.state.content_draft = "Hello".into();

        let outcome = gb.submit_message("  Alice ", " Hello ").await.unwrap();
        assert_eq!(outcome.toast, Some(MESSAGE_POSTED));

        let messages = gb.store().load_all().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].name, "Alice");
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[0].replies, Some(vec![]));
        assert!(gb.state.name_draft.is_empty());
        assert!(gb.state.content_draft.is_empty());
    }

    #[tokio::test]
    async fn blank_content_changes_nothing() {
        let mut gb = guestbook().await;
        gb.submit_message("Alice", "first").await.unwrap();
        let before = gb.store().storage().get_item(MESSAGES_KEY).await.unwrap();

        for blank in ["", "   ", "\n\t"] {
            let outcome = gb.submit_message("Alice", blank).await.unwrap();
            assert!(outcome.is_rejection());
            assert_eq!(outcome.alert, Some(Alert::Invalid(ValidationError::EmptyContent)));
        }
        assert_eq!(gb.store().storage().get_item(MESSAGES_KEY).await.unwrap(), before);
    }

    #[tokio::test]
    async fn actions_reopen_a_closed_guestbook() {
        let mut gb = guestbook().await;
        assert!(!gb.state.visible);
        let outcome = gb.submit_message("Alice", "   ").await.unwrap();
        assert!(gb.state.visible);
        assert!(outcome.focus_message);

        gb.hide();
        gb.submit_message("Alice", "Hello").await.unwrap();
        assert!(gb.state.visible);

        let id = gb.store().load_all().await[0].id;
        gb.hide();
        gb.toggle_reply_form(id).await;
        assert!(gb.state.visible);

        gb.hide();
        gb.submit_reply(id, "Bob", "hi").await.unwrap();
        assert!(gb.state.visible);
    }

    #[tokio::test]
    async fn rejected_reply_keeps_its_form_open() {
        let mut gb = guestbook().await;
        gb.submit_message("A", "one").await.unwrap();
        let id = gb.store().load_all().await[0].id;

        let outcome = gb.submit_reply(id, "B", "  ").await.unwrap();
        assert!(outcome.is_rejection());
        assert!(!outcome.focus_message);
        assert_eq!(gb.state.open_reply_form, Some(id));
    }

    #[tokio::test]
    async fn rejected_input_is_kept_as_draft() {
        let mut gb = guestbook().await;
        gb.submit_message(&"x".repeat(60), "hello").await.unwrap();
        assert_eq!(gb.state.name_draft, "x".repeat(60));
        assert_eq!(gb.state.content_draft, "hello");
        assert!(gb.store().load_all().await.is_empty());
    }

    #[tokio::test]
    async fn blank_name_uses_nickname() {
        let mut gb = guestbook().await;
        gb.submit_message("   ", "hi").await.unwrap();

        let profile: VisitorProfile = gb.store().storage().get_json(PROFILE_KEY).await.unwrap().unwrap();
        let messages = gb.store().load_all().await;
        assert_eq!(messages[0].name, profile.nickname);
        assert_eq!(messages[0].avatar, Some(profile.avatar));
    }

    #[tokio::test]
    async fn new_message_renders_above_older_ones() {
        let mut gb = guestbook().await;
        gb.submit_message("Bob", "older post").await.unwrap();
        gb.submit_message("Alice", "Hello").await.unwrap();

        let html = gb.threads_html().await;
        assert!(html.find("Hello").unwrap() < html.find("older post").unwrap());
    }

    #[tokio::test]
    async fn reply_grows_only_its_thread() {
        let mut gb = guestbook().await;
        gb.submit_message("A", "one").await.unwrap();
        gb.submit_message("B", "two").await.unwrap();
        let ids: Vec<i64> = gb.store().load_all().await.iter().map(|m| m.id).collect();

        gb.toggle_reply_form(ids[0]).await;
        let outcome = gb.submit_reply(ids[0], "C", "re: one").await.unwrap();
        assert_eq!(outcome.toast, Some(REPLY_POSTED));
        assert_eq!(gb.state.open_reply_form, None);

        let messages = gb.store().load_all().await;
        assert_eq!(messages[0].replies().len(), 1);
        assert_eq!(messages[0].replies()[0].content, "re: one");
        assert_eq!(messages[1].replies().len(), 0);
    }

    #[tokio::test]
    async fn reply_to_vanished_message_is_silent() {
        let mut gb = guestbook().await;
        gb.submit_message("A", "one").await.unwrap();
        let before = gb.store().storage().get_item(MESSAGES_KEY).await.unwrap();

        let outcome = gb.submit_reply(12345, "B", "anyone?").await.unwrap();
        assert_eq!(outcome, Outcome::default());
        assert_eq!(gb.store().storage().get_item(MESSAGES_KEY).await.unwrap(), before);
    }

    #[tokio::test]
    async fn only_one_reply_form_is_open() {
        let mut gb = guestbook().await;
        gb.submit_message("A", "one").await.unwrap();
        gb.submit_message("B", "two").await.unwrap();
        let ids: Vec<i64> = gb.store().load_all().await.iter().map(|m| m.id).collect();

        gb.toggle_reply_form(ids[0]).await;
        assert_eq!(gb.state.open_reply_form, Some(ids[0]));
        assert!(gb.threads_html().await.contains(&format!("id=\"replyContent{}\"", ids[0])));

        gb.toggle_reply_form(ids[1]).await;
        assert_eq!(gb.state.open_reply_form, Some(ids[1]));

        gb.toggle_reply_form(ids[1]).await;
        assert_eq!(gb.state.open_reply_form, None);

        gb.toggle_reply_form(999).await;
        assert_eq!(gb.state.open_reply_form, None);
    }

    #[tokio::test]
    async fn show_prefills_nickname_once() {
        let mut gb = guestbook().await;
        gb.show().await.unwrap();
        assert!(gb.state.visible);
        let nickname = gb.state.name_draft.clone();
        assert!(!nickname.is_empty());

        gb.state.name_draft = "Custom".into();
        gb.toggle().await.unwrap();
        assert!(!gb.state.visible);
        gb.toggle().await.unwrap();
        assert!(gb.state.visible);
        assert_eq!(gb.state.name_draft, "Custom");
    }

    #[tokio::test]
    async fn clearing_needs_confirmation() {
        let mut gb = guestbook().await;
        gb.submit_message("A", "one").await.unwrap();

        let outcome = gb.clear_all_messages(Confirmation::Declined).await.unwrap();
        assert_eq!(outcome, Outcome::default());
        assert_eq!(gb.store().load_all().await.len(), 1);

        let outcome = gb.clear_all_messages(Confirmation::Confirmed).await.unwrap();
        assert_eq!(outcome.alert, Some(Alert::Notice(MESSAGES_CLEARED)));
        assert!(gb.store().load_all().await.is_empty());
        assert!(gb.threads_html().await.contains("empty-messages"));
    }

    #[tokio::test]
    async fn every_post_mirrors_one_full_snapshot() {
        let server = MockServer::start_async().await;
        let gb_mirror = Mirror::new(Some(server.base_url())).unwrap();
        let mut gb = guestbook_mirrored_to(gb_mirror).await;

        let after_message = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/save-messages")
                    .body_includes("\"content\":\"one\"");
                then.status(200);
            })
            .await;
        gb.submit_message("A", "one").await.unwrap();
        wait_for_calls(&after_message, 1).await;
        after_message.assert_calls(1);
        after_message.delete_async().await;

        let after_reply = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/save-messages")
                    .body_includes("\"content\":\"one\"")
                    .body_includes("\"content\":\"re: one\"");
                then.status(200);
            })
            .await;
        let id = gb.store().load_all().await[0].id;
        gb.submit_reply(id, "B", "re: one").await.unwrap();
        wait_for_calls(&after_reply, 1).await;
        after_reply.assert_calls(1);
    }

    #[tokio::test]
    async fn failing_mirror_does_not_fail_the_post() {
        let server = MockServer::start_async().await;
        let save = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/save-messages");
                then.status(500);
            })
            .await;
        let mut gb = guestbook_mirrored_to(Mirror::new(Some(server.base_url())).unwrap()).await;

        let outcome = gb.submit_message("A", "kept").await.unwrap();
        assert_eq!(outcome.toast, Some(MESSAGE_POSTED));
        wait_for_calls(&save, 1).await;
        save.assert_calls(1);
        assert_eq!(gb.store().load_all().await[0].content, "kept");
    }

    #[tokio::test]
    async fn unreachable_mirror_does_not_fail_the_post() {
        let mirror = Mirror::new(Some("http://127.0.0.1:9".to_owned())).unwrap();
        let mut gb = guestbook_mirrored_to(mirror).await;

        let outcome = gb.submit_message("A", "kept").await.unwrap();
        assert_eq!(outcome.toast, Some(MESSAGE_POSTED));
        assert_eq!(gb.store().load_all().await.len(), 1);
    }
}
