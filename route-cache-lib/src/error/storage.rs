//! Durable storage error types

/// Errors raised by a [`StorageBackend`](crate::cache::StorageBackend) or while
/// (de)serializing a persisted cache table.
///
/// These never escape the cache: a table that hits one of them logs it and
/// degrades to an unpersisted, in-memory table for the rest of the session.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The SQLite store failed.
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),

    /// A table could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),

    /// A persisted table payload is corrupt or has an unexpected shape.
    #[error("corrupt payload for '{table}': {source}")]
    Corrupt {
        /// The table whose payload failed to decode.
        table: String,
        /// The underlying decode error.
        source: serde_json::Error,
    },
}
