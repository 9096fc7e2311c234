//! Record store façade
//!
//! Every operation opens its own connection, runs exactly one statement in one
//! transaction, and closes the connection after the commit. The blocking
//! SQLite work runs on tokio's blocking pool so concurrent callers never wait
//! on each other's I/O.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension, Transaction};

use crate::config::StoreConfig;
use crate::record::{NewRecord, Record};
use crate::storage::{RecordSql, SqliteEngine, TransactionMode};
use crate::{Error, Result};

/// The single-statement operations the store performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Add,
    Get,
    GetAll,
    GetByIndex,
    Edit,
    Delete,
}

impl Operation {
    fn mode(self) -> TransactionMode {
        match self {
            Operation::Get | Operation::GetAll | Operation::GetByIndex => TransactionMode::ReadOnly,
            Operation::Add | Operation::Edit | Operation::Delete => TransactionMode::ReadWrite,
        }
    }

    fn error(self, source: rusqlite::Error) -> Error {
        match self {
            Operation::Add => Error::Store(source),
            Operation::Get | Operation::GetAll | Operation::GetByIndex => Error::Retrieve(source),
            Operation::Edit => Error::Edit(source),
            Operation::Delete => Error::Delete(source),
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Operation::Add => "Element stored with success!",
            Operation::Get => "Data retrieved with success!",
            Operation::GetAll => "All data retrieved with success!",
            Operation::GetByIndex => "All data retrieved by index with success!",
            Operation::Edit => "Element edited with success!",
            Operation::Delete => "Element deleted with success!",
        }
    }
}

/// Async CRUD access to the configured record table.
#[derive(Debug, Clone)]
pub struct RecordStore {
    engine: SqliteEngine,
    config: Arc<StoreConfig>,
    sql: Arc<RecordSql>,
}

impl RecordStore {
    pub fn new(engine: SqliteEngine, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let sql = RecordSql::new(&config.table);
        Ok(Self {
            engine,
            config: Arc::new(config),
            sql: Arc::new(sql),
        })
    }

    /// Probe the configured data directory and build a store on it
    pub fn connect(config: StoreConfig) -> Result<Self> {
        let engine = SqliteEngine::probe(config.data_dir.as_deref())?;
        Self::new(engine, config)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn engine(&self) -> &SqliteEngine {
        &self.engine
    }

    /// Open the database once, creating or upgrading its schema, then close it.
    ///
    /// Returns the version the database is now at.
    pub async fn open_database(&self) -> Result<u32> {
        let engine = self.engine.clone();
        let config = Arc::clone(&self.config);

        let result = tokio::task::spawn_blocking(move || -> Result<u32> {
            let conn = engine.open(&config)?;
            let version = conn.version();
            conn.close();
            Ok(version)
        })
        .await?;

        let name = &self.config.database;
        match &result {
            Ok(_) => tracing::info!("Connection with {} opened with success!", name),
            Err(e) => tracing::error!(error = %e, "Connection with {} failed!", name),
        }
        result
    }

    /// Insert a new record; the engine assigns and returns its id
    pub async fn add(&self, record: NewRecord) -> Result<i64> {
        self.run(Operation::Add, move |tx, sql| {
            tx.execute(&sql.insert, params![record.second_id, record.name])?;
            Ok(tx.last_insert_rowid())
        })
        .await
    }

    /// Look up a record by primary key
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Record>> {
        self.run(Operation::Get, move |tx, sql| {
            tx.query_row(&sql.select_by_id, [id], row_to_record).optional()
        })
        .await
    }

    /// Every record, in primary key order
    pub async fn get_all(&self) -> Result<Vec<Record>> {
        self.run(Operation::GetAll, |tx, sql| {
            let mut stmt = tx.prepare(&sql.select_all)?;
            let records = stmt
                .query_map([], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    /// Every record whose `second_id` equals `second_id`, via the secondary index
    pub async fn get_all_by_second_id(&self, second_id: i64) -> Result<Vec<Record>> {
        self.run(Operation::GetByIndex, move |tx, sql| {
            let mut stmt = tx.prepare(&sql.select_by_second_id)?;
            let records = stmt
                .query_map([second_id], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    /// Write `record` under its id, replacing any existing record with that id
    pub async fn edit(&self, record: &Record) -> Result<i64> {
        let record = record.clone();
        self.run(Operation::Edit, move |tx, sql| {
            tx.execute(&sql.upsert, params![record.id, record.second_id, record.name])?;
            Ok(record.id)
        })
        .await
    }

    /// Remove the record with `id`; removing a missing id succeeds
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.run(Operation::Delete, move |tx, sql| {
            tx.execute(&sql.delete, [id])?;
            Ok(())
        })
        .await
    }

    async fn run<T, F>(&self, op: Operation, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>, &RecordSql) -> rusqlite::Result<T> + Send + 'static,
    {
        let engine = self.engine.clone();
        let config = Arc::clone(&self.config);
        let sql = Arc::clone(&self.sql);

        let result = tokio::task::spawn_blocking(move || -> Result<T> {
            let conn = engine.open(&config)?;
            conn.transact(op.mode(), |tx| f(tx, &sql), |e| op.error(e))
        })
        .await?;

        match &result {
            Ok(_) => tracing::info!("{}", op.success_message()),
            Err(e) => {
                let cause = std::error::Error::source(e).map(ToString::to_string);
                tracing::error!(?op, ?cause, "{}", e);
            }
        }
        result
    }
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get(0)?,
        second_id: row.get(1)?,
        name: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Unavailable;
    use std::collections::HashSet;

    fn store_in(dir: &tempfile::TempDir) -> RecordStore {
        RecordStore::connect(StoreConfig::in_dir(dir.path())).unwrap()
    }

    fn drop_table(store: &RecordStore) {
        let path = store.engine().database_path(store.config());
        let conn = rusqlite::Connection::open(path).unwrap();
        conn.execute("DROP TABLE \"DataBaseStore\"", []).unwrap();
    }

    #[tokio::test]
    async fn test_crud_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let id = store.add(NewRecord::new(1, "A")).await.unwrap();
        assert_eq!(id, 1);

        let record = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(record, Record { id: 1, second_id: 1, name: "A".into() });

        let written = store.edit(&record.renamed("B")).await.unwrap();
        assert_eq!(written, 1);
        let edited = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(edited, Record { id: 1, second_id: 1, name: "B".into() });

        store.delete(id).await.unwrap();
        assert_eq!(store.get_by_id(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_returns_fresh_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut seen = HashSet::new();
        for i in 0..5 {
            let id = store.add(NewRecord::new(i, format!("r{}", i))).await.unwrap();
            assert!(seen.insert(id));
        }

        // Keys are not reused after a delete
        let last = *seen.iter().max().unwrap();
        store.delete(last).await.unwrap();
        let next = store.add(NewRecord::new(9, "after delete")).await.unwrap();
        assert!(!seen.contains(&next));
    }

    #[tokio::test]
    async fn test_get_after_add_matches_input() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let input = NewRecord::new(42, "payload");
        let id = store.add(input.clone()).await.unwrap();

        let stored = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored, input.with_id(id));
    }

    #[tokio::test]
    async fn test_get_all_in_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.get_all().await.unwrap().is_empty());

        for name in ["c", "a", "b"] {
            store.add(NewRecord::new(1, name)).await.unwrap();
        }

        let names: Vec<_> = store.get_all().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_get_all_by_second_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let a = store.add(NewRecord::new(1, "a")).await.unwrap();
        store.add(NewRecord::new(2, "b")).await.unwrap();
        let c = store.add(NewRecord::new(1, "c")).await.unwrap();

        let ones: Vec<_> = store
            .get_all_by_second_id(1)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ones, vec![a, c]);
        assert!(store.get_all_by_second_id(3).await.unwrap().is_empty());

        // Moving a record to another second_id moves it out of the lookup
        let moved = Record { id: a, second_id: 2, name: "a".into() };
        store.edit(&moved).await.unwrap();
        let ones: Vec<_> = store.get_all_by_second_id(1).await.unwrap();
        assert_eq!(ones.len(), 1);
        assert_eq!(ones[0].id, c);
        assert_eq!(store.get_all_by_second_id(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_creates_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let record = Record { id: 10, second_id: 5, name: "upserted".into() };
        assert_eq!(store.edit(&record).await.unwrap(), 10);
        assert_eq!(store.get_by_id(10).await.unwrap(), Some(record));

        // The key generator moves past explicitly written keys
        let next = store.add(NewRecord::new(5, "next")).await.unwrap();
        assert!(next > 10);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.delete(999).await.unwrap();
        assert_eq!(store.get_by_id(999).await.unwrap(), None);

        let id = store.add(NewRecord::new(1, "x")).await.unwrap();
        store.delete(id).await.unwrap();
        store.delete(id).await.unwrap();
        assert_eq!(store.get_by_id(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_adds() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.open_database().await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.add(NewRecord::new(i % 2, format!("n{}", i))).await
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap());
        }
        assert_eq!(ids.len(), 8);
        assert_eq!(store.get_all().await.unwrap().len(), 8);
        assert_eq!(store.get_all_by_second_id(0).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_open_database_reports_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.open_database().await.unwrap(), 1);
        assert_eq!(store.open_database().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_engine_failures_map_to_operation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.open_database().await.unwrap();
        drop_table(&store);

        let err = store.add(NewRecord::new(1, "x")).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(err.to_string(), "Element store fail!");
        assert!(std::error::Error::source(&err).is_some());

        assert!(matches!(store.get_by_id(1).await, Err(Error::Retrieve(_))));
        assert!(matches!(store.get_all().await, Err(Error::Retrieve(_))));
        assert!(matches!(store.get_all_by_second_id(1).await, Err(Error::Retrieve(_))));

        let record = Record { id: 1, second_id: 1, name: "x".into() };
        assert!(matches!(store.edit(&record).await, Err(Error::Edit(_))));
        assert!(matches!(store.delete(1).await, Err(Error::Delete(_))));
    }

    #[tokio::test]
    async fn test_older_store_cannot_open_upgraded_database() {
        let dir = tempfile::tempdir().unwrap();
        let v1 = store_in(&dir);
        let id = v1.add(NewRecord::new(1, "kept")).await.unwrap();

        let v2 = RecordStore::connect(StoreConfig {
            version: 2,
            ..StoreConfig::in_dir(dir.path())
        })
        .unwrap();
        assert_eq!(v2.get_by_id(id).await.unwrap().unwrap().name, "kept");

        assert!(matches!(v1.get_all().await, Err(Error::VersionMismatch { .. })));
    }

    #[tokio::test]
    async fn test_newer_store_closes_handle_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let v1 = store_in(&dir);
        v1.add(NewRecord::new(1, "before")).await.unwrap();
        let held = v1.engine().open(v1.config()).unwrap();

        let v2 = RecordStore::connect(StoreConfig {
            version: 2,
            ..StoreConfig::in_dir(dir.path())
        })
        .unwrap();
        assert_eq!(v2.open_database().await.unwrap(), 2);

        let err = held
            .transact(TransactionMode::ReadOnly, |_| Ok(()), Error::Retrieve)
            .unwrap_err();
        assert!(matches!(err, Error::VersionChange { newer: 2, .. }));

        let id = v2.add(NewRecord::new(1, "after")).await.unwrap();
        assert_eq!(v2.get_all_by_second_id(1).await.unwrap().len(), 2);
        v2.delete(id).await.unwrap();
        assert_eq!(v2.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_upgrade_leaves_older_store_usable() {
        let dir = tempfile::tempdir().unwrap();
        let v1 = store_in(&dir);
        v1.add(NewRecord::new(1, "kept")).await.unwrap();

        // Another connection holds the write lock until the upgrade gives up
        let path = v1.engine().database_path(v1.config());
        let blocker = rusqlite::Connection::open(path).unwrap();
        blocker.execute_batch("BEGIN IMMEDIATE").unwrap();

        let v2 = RecordStore::connect(StoreConfig {
            version: 2,
            ..StoreConfig::in_dir(dir.path())
        })
        .unwrap();
        assert!(matches!(v2.open_database().await, Err(Error::Open { .. })));
        blocker.execute_batch("ROLLBACK").unwrap();

        assert_eq!(v1.get_all().await.unwrap().len(), 1);
        v1.add(NewRecord::new(2, "still writable")).await.unwrap();
        assert_eq!(v1.open_database().await.unwrap(), 1);
    }

    #[test]
    fn test_connect_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig { table: String::new(), ..StoreConfig::in_dir(dir.path()) };
        assert!(matches!(RecordStore::connect(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_connect_without_data_dir_is_unavailable() {
        let err = RecordStore::connect(StoreConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Unavailable(Unavailable::NotConfigured)));
    }
}
