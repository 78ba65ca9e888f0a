use tokio::task::JoinHandle;

use crate::{storage::{ClientStorage, MESSAGES_KEY}, AppResult};

use super::{parse_messages, Message, Mirror, Reply};

pub const MIRROR_PATH: &str = "/api/save-messages";

/// A client's messages, kept in its storage namespace and mirrored remotely.
/// Order on disk is insertion order; sorting is left to rendering.
#[derive(Clone, Debug)]
pub struct ThreadStore {
    storage: ClientStorage,
    mirror: Mirror,
}

impl ThreadStore {
    pub fn new(storage: ClientStorage, mirror: Mirror) -> ThreadStore {
        ThreadStore { storage, mirror }
    }

    pub fn storage(&self) -> &ClientStorage {
        &self.storage
    }

    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    /// Never fails: unreadable or missing data is an empty guestbook.
    pub async fn load_all(&self) -> Vec<Message> {
        match self.read().await {
            Ok(messages) => messages,
            Err(err) => {
                tracing::error!(client_id = self.storage.client_id(), "loading messages failed: {:#}", err.0);
                Vec::new()
            }
        }
    }

    pub async fn contains(&self, message_id: i64) -> bool {
        self.load_all().await.iter().any(|msg| msg.id == message_id)
    }

    pub async fn append(&self, message: Message) -> AppResult<()> {
        let _guard = self.storage.lock().await;
        let mut messages = self.read().await?;
        messages.push(message);
        self.write(&messages).await
    }

    /// Adds a reply under the first message with `message_id`. Returns false
    /// and writes nothing when there is no such message.
    pub async fn append_reply(&self, message_id: i64, reply: Reply) -> AppResult<bool> {
        let _guard = self.storage.lock().await;
        let mut messages = self.read().await?;
        let Some(message) = messages.iter_mut().find(|msg| msg.id == message_id) else {
            return Ok(false);
        };

        message.replies.get_or_insert_with(Vec::new).push(reply);
        self.write(&messages).await?;
        Ok(true)
    }

    pub fn mirror_remote(&self, snapshot: &[Message]) -> Option<JoinHandle<()>> {
        self.mirror.post_json(MIRROR_PATH, snapshot)
    }

    pub async fn clear_all(&self) -> AppResult<()> {
        let _guard = self.storage.lock().await;
        self.storage.remove_item(MESSAGES_KEY).await
    }

    async fn read(&self) -> AppResult<Vec<Message>> {
        Ok(self
            .storage
            .get_item(MESSAGES_KEY)
            .await?
            .map(|raw| parse_messages(&raw))
            .unwrap_or_default())
    }

    async fn write(&self, messages: &[Message]) -> AppResult<()> {
        self.storage.set_json(MESSAGES_KEY, messages).await
    }
}
