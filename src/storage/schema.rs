//! Database schema definitions
//!
//! The record table and its `second_id` index are created once, when a
//! database moves from "no schema" (version 0) to version 1.

use rusqlite::Connection;

use crate::config::StoreConfig;

/// Quote an identifier for use in SQL text
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQL to create the record table
pub fn create_table(table: &str) -> String {
    format!(
        r#"
CREATE TABLE {} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    second_id INTEGER NOT NULL,
    name TEXT NOT NULL
)
"#,
        quote_ident(table)
    )
}

/// SQL to create the secondary index on `second_id`
pub fn create_index(index: &str, table: &str) -> String {
    format!(
        "CREATE INDEX {} ON {}(second_id)",
        quote_ident(index),
        quote_ident(table)
    )
}

/// What the upgrade step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeOutcome {
    Created,
    Skipped,
}

/// Creates the table and index on the 0 -> 1 version transition.
pub struct SchemaInitializer<'a> {
    config: &'a StoreConfig,
}

impl<'a> SchemaInitializer<'a> {
    pub fn new(config: &'a StoreConfig) -> Self {
        Self { config }
    }

    /// Run inside the upgrade transaction when the requested version exceeds the stored one.
    ///
    /// Versions past 1 have no migration yet, so any transition touching them is a no-op.
    pub fn on_upgrade_needed(
        &self,
        conn: &Connection,
        old_version: u32,
        new_version: u32,
    ) -> rusqlite::Result<UpgradeOutcome> {
        if old_version > 1 || new_version > 1 {
            tracing::debug!(
                old_version,
                new_version,
                "No schema change for this version transition"
            );
            return Ok(UpgradeOutcome::Skipped);
        }

        conn.execute(&create_table(&self.config.table), [])?;
        conn.execute(&create_index(&self.config.index, &self.config.table), [])?;
        tracing::info!(
            table = %self.config.table,
            index = %self.config.index,
            "Created record table and secondary index"
        );
        Ok(UpgradeOutcome::Created)
    }
}

/// Statements for the single-record operations, built once per store
#[derive(Debug, Clone)]
pub struct RecordSql {
    pub insert: String,
    pub upsert: String,
    pub select_by_id: String,
    pub select_all: String,
    pub select_by_second_id: String,
    pub delete: String,
}

impl RecordSql {
    pub fn new(table: &str) -> Self {
        let table = quote_ident(table);
        Self {
            insert: format!("INSERT INTO {} (second_id, name) VALUES (?1, ?2)", table),
            upsert: format!(
                "INSERT OR REPLACE INTO {} (id, second_id, name) VALUES (?1, ?2, ?3)",
                table
            ),
            select_by_id: format!("SELECT id, second_id, name FROM {} WHERE id = ?1", table),
            select_all: format!("SELECT id, second_id, name FROM {} ORDER BY id", table),
            select_by_second_id: format!(
                "SELECT id, second_id, name FROM {} WHERE second_id = ?1 ORDER BY id",
                table
            ),
            delete: format!("DELETE FROM {} WHERE id = ?1", table),
        }
    }
}
