//! Error types for the storage layer.

use thiserror::Error;

/// A value could not be turned into, or back from, its persisted text.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed buffer at {path}")]
    MalformedBuffer { path: String },
}

/// The durable backend failed to run a statement.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage task failed: {0}")]
    Task(String),

    #[error("backend: {0}")]
    Backend(String),
}

/// Errors surfaced by [`SessionStore`](crate::SessionStore) writes and deletes.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
