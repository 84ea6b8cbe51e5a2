//! # cm-store-sqlite Implementation
//!
//! This module maps the string-document `KvBackend` contract onto a single
//! SQLite table. Each write is one upsert statement, so a document is either
//! fully replaced or untouched.

use anyhow::Context;
use async_trait::async_trait;
use cm_core::traits::KvBackend;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    /// Connects (creating the database file if needed) and ensures the schema.
    ///
    /// # Developer Note
    /// The pool is capped at one connection: `sqlite::memory:` databases are
    /// per-connection, and the store is single-writer anyway.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("parsing sqlite url '{url}'"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("connecting to '{url}'"))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .context("creating kv table")?;

        tracing::debug!(url, "sqlite store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl KvBackend for SqliteKvStore {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("reading '{key}'"))?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("writing '{key}'"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("removing '{key}'"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let store = SqliteKvStore::new("sqlite::memory:").await.unwrap();

        assert_eq!(store.read("reports").await.unwrap(), None);
        store.write("reports", "[]").await.unwrap();
        store.write("reports", "[{\"id\":\"r1\"}]").await.unwrap();
        assert_eq!(
            store.read("reports").await.unwrap().as_deref(),
            Some("[{\"id\":\"r1\"}]")
        );

        store.remove("reports").await.unwrap();
        assert_eq!(store.read("reports").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("market.db").display());

        let first = SqliteKvStore::new(&url).await.unwrap();
        first.write("wishlist", "[\"a\"]").await.unwrap();
        drop(first);

        let second = SqliteKvStore::new(&url).await.unwrap();
        assert_eq!(second.read("wishlist").await.unwrap().as_deref(), Some("[\"a\"]"));
    }
}
