use std::{path::Path, str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::{
    query,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};
use thiserror::Error;

pub mod blacklist;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blacklist storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// Persistent set of URLs confirmed as bad. URLs are compared as exact strings.
#[async_trait]
pub trait BlacklistStore: Send + Sync {
    async fn contains(&self, url: &str) -> Result<bool, StorageError>;

    /// Returns `true` when a new entry was written; inserting a known URL is a no-op.
    async fn insert(&self, url: &str) -> Result<bool, StorageError>;
}

pub async fn init_pool(db_path: &Path) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    query(
        r#"
        CREATE TABLE IF NOT EXISTS urls (
            id INTEGER PRIMARY KEY,
            url TEXT NOT NULL UNIQUE,
            added_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await?;

    tracing::debug!(target: "db", path = %db_path.display(), "blacklist database ready");
    Ok(pool)
}
