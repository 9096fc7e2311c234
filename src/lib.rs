//! # Recordstore - connection-per-operation record persistence
//!
//! A thin async façade over a versioned, transactional SQLite database.
//!
//! Recordstore provides:
//! - A fixed record shape (`id`, `second_id`, `name`) with an engine-assigned primary key
//! - One-time schema creation guarded by the database version
//! - A fresh connection per operation, closed once its transaction commits
//! - Secondary-index lookup by `second_id`
//! - A capability check that reports why storage is unavailable instead of failing silently

pub mod record;
pub mod config;
pub mod storage;
pub mod store;
pub mod demo;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use record::{NewRecord, Record};
pub use config::StoreConfig;
pub use storage::{SqliteEngine, Unavailable};
pub use store::RecordStore;

/// Result type alias for Recordstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Recordstore operations
///
/// The CRUD variants display a fixed outcome message; the engine error that
/// caused them stays reachable through `source()`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Connection with {name} failed!")]
    Open {
        name: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database {name} is at version {stored}, cannot open it at version {requested}")]
    VersionMismatch {
        name: String,
        stored: u32,
        requested: u32,
    },

    #[error("Connection with {name} closed: version {newer} was requested elsewhere")]
    VersionChange { name: String, newer: u32 },

    #[error("Element store fail!")]
    Store(#[source] rusqlite::Error),

    #[error("Data retrieve fail!")]
    Retrieve(#[source] rusqlite::Error),

    #[error("Element edit fail!")]
    Edit(#[source] rusqlite::Error),

    #[error("Element delete fail!")]
    Delete(#[source] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(i64),

    #[error("Storage unavailable: {0}")]
    Unavailable(#[from] Unavailable),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
