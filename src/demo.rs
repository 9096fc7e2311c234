//! Startup sequence
//!
//! Checks that storage is usable, opens the database (creating the schema on
//! first run), then walks one record through add, read, edit, read, delete.

use serde::Serialize;

use crate::config::StoreConfig;
use crate::record::{NewRecord, Record};
use crate::storage::{SqliteEngine, Unavailable};
use crate::store::RecordStore;
use crate::{Error, Result};

pub const DEMO_SECOND_ID: i64 = 1;
pub const DEMO_NAME: &str = "New Test data";
pub const DEMO_EDITED_NAME: &str = "Test data Edited";

/// What happened at startup
#[derive(Debug)]
pub enum Startup {
    /// Storage cannot be used here; nothing was touched
    Unavailable(Unavailable),
    Completed(DemoReport),
}

/// The record as seen at each step of the sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoReport {
    pub version: u32,
    pub initial: Record,
    pub edited: Record,
    pub deleted_id: i64,
}

/// Run the startup sequence against `config`
pub async fn start(config: StoreConfig) -> Result<Startup> {
    let engine = match SqliteEngine::probe(config.data_dir.as_deref()) {
        Ok(engine) => engine,
        Err(reason) => {
            tracing::debug!(%reason, "Storage unavailable, skipping startup");
            return Ok(Startup::Unavailable(reason));
        }
    };

    let store = RecordStore::new(engine, config)?;
    let version = store.open_database().await?;
    let report = run_sequence(&store, version).await?;
    Ok(Startup::Completed(report))
}

/// add -> get -> edit -> get -> delete, on an already opened store
pub async fn run_sequence(store: &RecordStore, version: u32) -> Result<DemoReport> {
    let id = store.add(NewRecord::new(DEMO_SECOND_ID, DEMO_NAME)).await?;
    let initial = store.get_by_id(id).await?.ok_or(Error::NotFound(id))?;
    tracing::info!(%initial, "Initial element");

    store.edit(&initial.renamed(DEMO_EDITED_NAME)).await?;
    let edited = store.get_by_id(id).await?.ok_or(Error::NotFound(id))?;
    tracing::info!(%edited, "Edited element");

    store.delete(id).await?;

    Ok(DemoReport {
        version,
        initial,
        edited,
        deleted_id: id,
    })
}
