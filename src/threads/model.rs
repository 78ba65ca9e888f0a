use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::profiles::{generate_avatar, Avatar};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Avatar>,
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
}

/// A top level guestbook entry. Replies live only inside their message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Avatar>,
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<Reply>>,
}

impl Reply {
    pub fn new(id: i64, name: String, content: String, timestamp: String) -> Reply {
        let avatar = generate_avatar(Some(&name));
        Reply {
            id,
            name,
            avatar: Some(avatar),
            content,
            timestamp,
        }
    }
}

impl Message {
    pub fn new(id: i64, name: String, content: String, timestamp: String) -> Message {
        let avatar = generate_avatar(Some(&name));
        Message {
            id,
            name,
            avatar: Some(avatar),
            content,
            timestamp,
            replies: Some(Vec::new()),
        }
    }

    pub fn replies(&self) -> &[Reply] {
        self.replies.as_deref().unwrap_or_default()
    }
}

/// Keeps the entries that still look like messages and drops the rest.
/// Replies are checked one by one, so a bad reply never takes its thread
/// with it, and an avatar that does not parse is left out.
pub fn normalize_messages(values: Vec<Value>) -> Vec<Message> {
    let total = values.len();
    let messages: Vec<Message> = values.into_iter().filter_map(normalize_message).collect();

    if messages.len() != total {
        tracing::warn!(dropped = total - messages.len(), "dropped malformed messages");
    }
    messages
}

fn normalize_message(mut value: Value) -> Option<Message> {
    let object = value.as_object_mut()?;
    let replies = object.remove("replies");
    drop_bad_avatar(object);

    let mut message: Message = serde_json::from_value(value).ok()?;
    message.replies = match replies {
        Some(Value::Array(items)) => {
            let total = items.len();
            let replies: Vec<Reply> = items.into_iter().filter_map(normalize_reply).collect();
            if replies.len() != total {
                tracing::warn!(message_id = message.id, dropped = total - replies.len(), "dropped malformed replies");
            }
            Some(replies)
        }
        _ => None,
    };
    Some(message)
}

fn normalize_reply(mut value: Value) -> Option<Reply> {
    drop_bad_avatar(value.as_object_mut()?);
    serde_json::from_value(value).ok()
}

fn drop_bad_avatar(object: &mut Map<String, Value>) {
    let readable = object
        .get("avatar")
        .is_none_or(|avatar| Avatar::deserialize(avatar).is_ok());
    if !readable {
        object.remove("avatar");
    }
}

/// Parses a stored message array. Anything that is not an array reads as empty.
pub fn parse_messages(raw: &str) -> Vec<Message> {
    match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(values) => normalize_messages(values),
        Err(err) => {
            tracing::warn!("unreadable message list, starting empty: {err}");
            Vec::new()
        }
    }
}
