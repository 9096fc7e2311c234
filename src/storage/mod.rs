//! Storage Layer - versioned SQLite databases
//!
//! One database file per configured name, holding:
//! - the record table (id, second_id, name)
//! - one non-unique index on second_id
//!
//! The schema version lives in the SQLite `user_version` header field.

pub mod connection;
pub mod engine;
pub mod schema;

pub use connection::{DbConnection, TransactionMode};
pub use engine::{SqliteEngine, Unavailable};
pub use schema::{RecordSql, SchemaInitializer, UpgradeOutcome};
