use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{storage::{ClientLocks, ClientStorage}, AppResult};

pub const CLIENT_ID: &str = "client_id";
pub const GUESTBOOK_STATE: &str = "guestbook_state";

/// Storage namespace for whoever holds this session, minting a client id on first use.
pub async fn client_storage(
    session: &Session,
    db_pool: &SqlitePool,
    locks: &ClientLocks,
) -> AppResult<ClientStorage> {
    let client_id = match session.get::<String>(CLIENT_ID).await? {
        Some(client_id) => client_id,
        None => {
            let client_id = Uuid::now_v7().to_string();
            tracing::debug!(%client_id, "new client");
            session.insert(CLIENT_ID, &client_id).await?;
            client_id
        }
    };

    Ok(ClientStorage::shared(db_pool.clone(), client_id, locks))
}
