//! SQLite engine: capability check, versioned open, version-change registry

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use rusqlite::{Connection, TransactionBehavior};
use tokio::sync::watch;

use super::connection::DbConnection;
use super::schema::{SchemaInitializer, UpgradeOutcome};
use crate::config::StoreConfig;
use crate::{Error, Result};

/// Latest version announced per database file, shared by every handle in the process.
///
/// An entry lives while some handle still watches it; entries without receivers
/// are dropped the next time a database is opened.
static VERSIONS: OnceLock<Mutex<HashMap<PathBuf, watch::Sender<u32>>>> = OnceLock::new();

/// Why the storage engine cannot be used in this environment
#[derive(Debug, thiserror::Error)]
pub enum Unavailable {
    #[error("no data directory configured")]
    NotConfigured,

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot create {}: {source}", .path.display())]
    CannotCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is read-only", .0.display())]
    ReadOnly(PathBuf),
}

/// Opens versioned SQLite databases under one data directory.
#[derive(Debug, Clone)]
pub struct SqliteEngine {
    data_dir: Arc<PathBuf>,
}

impl SqliteEngine {
    /// Check that databases can live in `data_dir`, creating it if needed
    pub fn probe(data_dir: Option<&Path>) -> std::result::Result<Self, Unavailable> {
        let dir = data_dir.ok_or(Unavailable::NotConfigured)?;

        if dir.exists() {
            let metadata = std::fs::metadata(dir).map_err(|source| Unavailable::CannotCreate {
                path: dir.to_path_buf(),
                source,
            })?;
            if !metadata.is_dir() {
                return Err(Unavailable::NotADirectory(dir.to_path_buf()));
            }
            if metadata.permissions().readonly() {
                return Err(Unavailable::ReadOnly(dir.to_path_buf()));
            }
        } else {
            std::fs::create_dir_all(dir).map_err(|source| Unavailable::CannotCreate {
                path: dir.to_path_buf(),
                source,
            })?;
            tracing::debug!("Created data directory {}", dir.display());
        }

        Ok(Self {
            data_dir: Arc::new(dir.to_path_buf()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_path(&self, config: &StoreConfig) -> PathBuf {
        config.database_path(&self.data_dir)
    }

    /// Open `config.database` at `config.version`, upgrading the schema if the
    /// stored version is older.
    pub fn open(&self, config: &StoreConfig) -> Result<DbConnection> {
        let path = self.database_path(config);
        let open_err = |source| Error::Open {
            name: config.database.clone(),
            source,
        };

        let mut conn = Connection::open(&path).map_err(open_err)?;
        let stored = user_version(&conn).map_err(open_err)?;
        if stored > config.version {
            return Err(Error::VersionMismatch {
                name: config.database.clone(),
                stored,
                requested: config.version,
            });
        }

        let announced = subscribe(&path);
        if config.version > stored {
            announce(&path, config.version);
            if let Err(e) = upgrade(&mut conn, config) {
                // Older handles keep working if the upgrade never landed
                let current = user_version(&conn).unwrap_or(stored);
                retract(&path, config.version, current);
                tracing::warn!(
                    name = %config.database,
                    requested = config.version,
                    current,
                    error = %e,
                    "Upgrade failed"
                );
                return Err(open_err(e));
            }
        }

        tracing::debug!(name = %config.database, version = config.version, "Connection opened");
        Ok(DbConnection::new(
            conn,
            config.database.clone(),
            config.version,
            announced,
        ))
    }
}

/// Run the upgrade in one exclusive transaction; dropping it on error rolls back
fn upgrade(conn: &mut Connection, config: &StoreConfig) -> rusqlite::Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;
    // Another opener may have upgraded between the first read and the lock
    let old_version = user_version(&tx)?;
    if config.version > old_version {
        let outcome =
            SchemaInitializer::new(config).on_upgrade_needed(&tx, old_version, config.version)?;
        tx.pragma_update(None, "user_version", config.version)?;
        tracing::debug!(
            name = %config.database,
            old_version,
            new_version = config.version,
            created = (outcome == UpgradeOutcome::Created),
            "Upgraded database"
        );
    }
    tx.commit()
}

fn user_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

fn registry() -> std::sync::MutexGuard<'static, HashMap<PathBuf, watch::Sender<u32>>> {
    VERSIONS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn subscribe(path: &Path) -> watch::Receiver<u32> {
    let mut versions = registry();
    versions.retain(|_, sender| sender.receiver_count() > 0);
    versions
        .entry(path.to_path_buf())
        .or_insert_with(|| watch::channel(0).0)
        .subscribe()
}

/// Tell every open handle on `path` that `version` is being opened
fn announce(path: &Path, version: u32) {
    if let Some(sender) = registry().get(path) {
        sender.send_if_modified(|current| {
            if version > *current {
                *current = version;
                true
            } else {
                false
            }
        });
    }
}

/// Undo a failed announcement, unless a later opener has announced since
fn retract(path: &Path, announced: u32, version: u32) {
    if let Some(sender) = registry().get(path) {
        sender.send_if_modified(|current| {
            if *current == announced && version < announced {
                *current = version;
                true
            } else {
                false
            }
        });
    }
}
