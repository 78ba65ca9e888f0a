use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::AppResult;

pub const PROFILE_KEY: &str = "planet.profile";
pub const MESSAGES_KEY: &str = "planet.messages";
pub const STATS_KEY: &str = "planet.stats";
pub const VISITS_KEY: &str = "planet.visits";

pub const ALL_KEYS: [&str; 4] = [STATS_KEY, MESSAGES_KEY, PROFILE_KEY, VISITS_KEY];

/// Hands out one write lock per client id, shared by every request that
/// client makes. Locks nobody holds are forgotten.
#[derive(Clone, Default, Debug)]
pub struct ClientLocks(Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>);

impl ClientLocks {
    pub fn for_client(&self, client_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(client_id.to_owned()).or_default().clone()
    }
}

/// One client's key/value namespace. Values are opaque strings, usually JSON.
#[derive(Clone, Debug)]
pub struct ClientStorage {
    db_pool: SqlitePool,
    client_id: String,
    write_lock: Arc<AsyncMutex<()>>,
}

impl ClientStorage {
    /// Storage with a lock of its own. Handles that must exclude each other
    /// come from [`ClientStorage::shared`].
    pub fn new(db_pool: SqlitePool, client_id: impl Into<String>) -> ClientStorage {
        ClientStorage {
            db_pool,
            client_id: client_id.into(),
            write_lock: Arc::default(),
        }
    }

    pub fn shared(db_pool: SqlitePool, client_id: impl Into<String>, locks: &ClientLocks) -> ClientStorage {
        let client_id = client_id.into();
        let write_lock = locks.for_client(&client_id);
        ClientStorage { db_pool, client_id, write_lock }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Held across a read-modify-write of one record.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    pub async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        let value: Option<(String,)> =
            sqlx::query_as("SELECT value FROM client_storage WHERE client_id=? AND key=?")
                .bind(&self.client_id)
                .bind(key)
                .fetch_optional(&self.db_pool)
                .await?;
        Ok(value.map(|(value,)| value))
    }

    pub async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO client_storage (client_id,key,value) VALUES (?,?,?)
             ON CONFLICT(client_id,key) DO UPDATE SET value=excluded.value",
        )
        .bind(&self.client_id)
        .bind(key)
        .bind(value)
        .execute(&self.db_pool)
        .await?;
        Ok(())
    }

    pub async fn remove_item(&self, key: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM client_storage WHERE client_id=? AND key=?")
            .bind(&self.client_id)
            .bind(key)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    pub async fn keys(&self) -> AppResult<Vec<String>> {
        let keys: Vec<(String,)> =
            sqlx::query_as("SELECT key FROM client_storage WHERE client_id=? ORDER BY key")
                .bind(&self.client_id)
                .fetch_all(&self.db_pool)
                .await?;
        Ok(keys.into_iter().map(|(key,)| key).collect())
    }

    /// Reads a JSON value. A record that no longer parses counts as absent.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let Some(raw) = self.get_item(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!(client_id = %self.client_id, key, "discarding unreadable record: {err}");
                Ok(None)
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        self.set_item(key, &serde_json::to_string(value)?).await
    }
}
