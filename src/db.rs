use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::AppResult;

pub async fn connect(database_url: &str) -> AppResult<SqlitePool> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(database_url)
        .await?;
    migrate(&db_pool).await?;
    Ok(db_pool)
}

/// Single connection so every query sees the same in-memory database.
pub async fn connect_in_memory() -> AppResult<SqlitePool> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    migrate(&db_pool).await?;
    Ok(db_pool)
}

pub async fn migrate(db_pool: &SqlitePool) -> AppResult<()> {
    // unique: client_id, key
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS client_storage (
            client_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (client_id, key)
        )",
    )
    .execute(db_pool)
    .await?;
    Ok(())
}
