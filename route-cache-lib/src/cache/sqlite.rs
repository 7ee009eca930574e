//! SQLite-backed durable storage.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_trait::async_trait;

use super::StorageBackend;
use crate::error::StorageError;

/// A [`StorageBackend`] backed by a SQLite key/value table.
///
/// Data persists across process restarts. Uses WAL journal mode.
///
/// # Example
///
/// ```ignore
/// use route_cache::cache::SqliteStorage;
///
/// let storage = SqliteStorage::open("route-cache.db").await?;
/// ```
pub struct SqliteStorage {
    client: Client,
}

impl SqliteStorage {
    /// Opens the store at the specified path.
    ///
    /// Creates the database file and table if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    /// Opens an in-memory SQLite store.
    ///
    /// Data is lost when the store is dropped.
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    async fn init_schema(client: &Client) -> Result<(), StorageError> {
        client
            .conn(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS kv (
                        key TEXT PRIMARY KEY,
                        value TEXT NOT NULL
                    )",
                    [],
                )
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    async fn get_text(&self, key: &str) -> Result<Option<String>, StorageError> {
        let key = key.to_string();

        let value = self
            .client
            .conn(move |conn| {
                let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?")?;
                let mut rows = stmt.query([&key])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get::<_, String>(0)?)),
                    None => Ok(None),
                }
            })
            .await?;

        Ok(value)
    }

    async fn set_text(&self, key: &str, value: String) -> Result<(), StorageError> {
        let key = key.to_string();

        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT INTO kv (key, value) VALUES (?, ?)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    rusqlite::params![key, value],
                )
            })
            .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = key.to_string();

        self.client
            .conn(move |conn| conn.execute("DELETE FROM kv WHERE key = ?", [key]))
            .await?;

        Ok(())
    }
}
