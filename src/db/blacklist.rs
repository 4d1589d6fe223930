use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{
    query, query_as, query_scalar,
    sqlite::{SqlitePool, SqliteRow},
    FromRow, Row,
};

use super::{BlacklistStore, StorageError};

#[derive(Clone)]
pub struct BlacklistRepository {
    pool: SqlitePool,
}

impl BlacklistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn list(&self) -> Result<Vec<BlacklistEntry>, StorageError> {
        let rows = query_as::<_, BlacklistEntry>(
            r#"SELECT url, added_at FROM urls ORDER BY added_at DESC, id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64, StorageError> {
        let total: i64 = query_scalar(r#"SELECT COUNT(*) FROM urls"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

#[async_trait]
impl BlacklistStore for BlacklistRepository {
    async fn contains(&self, url: &str) -> Result<bool, StorageError> {
        let result: Option<(i64,)> = query_as(r#"SELECT id FROM urls WHERE url = ?1"#)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.is_some())
    }

    async fn insert(&self, url: &str) -> Result<bool, StorageError> {
        let affected = query(r#"INSERT OR IGNORE INTO urls (url) VALUES (?1)"#)
            .bind(url)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if affected > 0 {
            tracing::info!(target: "db", url, "url added to blacklist");
        } else {
            tracing::debug!(target: "db", url, "url already blacklisted");
        }
        Ok(affected > 0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlacklistEntry {
    pub url: String,
    pub added_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for BlacklistEntry {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            url: row.try_get("url")?,
            added_at: row.try_get("added_at")?,
        })
    }
}
