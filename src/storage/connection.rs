//! A single live connection to a versioned database

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tokio::sync::watch;

use crate::{Error, Result};

/// Transaction mode for a single operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

impl TransactionMode {
    fn behavior(self) -> TransactionBehavior {
        match self {
            TransactionMode::ReadOnly => TransactionBehavior::Deferred,
            TransactionMode::ReadWrite => TransactionBehavior::Immediate,
        }
    }
}

/// An open database handle at a fixed version.
///
/// The handle watches the version announced for its database; once a newer
/// version is requested elsewhere it refuses further work and closes itself.
#[derive(Debug)]
pub struct DbConnection {
    conn: Connection,
    name: String,
    version: u32,
    announced: watch::Receiver<u32>,
}

impl DbConnection {
    pub(crate) fn new(
        conn: Connection,
        name: String,
        version: u32,
        announced: watch::Receiver<u32>,
    ) -> Self {
        Self {
            conn,
            name,
            version,
            announced,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// True once another opener has requested a newer version of this database
    pub fn version_change_pending(&self) -> bool {
        *self.announced.borrow() > self.version
    }

    /// Run one operation in one transaction, then close the connection.
    ///
    /// The connection is closed only after the commit has completed. Failures
    /// of the operation or of the commit go through `map_err`.
    pub fn transact<T, F, M>(self, mode: TransactionMode, op: F, map_err: M) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
        M: FnOnce(rusqlite::Error) -> Error,
    {
        if self.version_change_pending() {
            let newer = *self.announced.borrow();
            tracing::debug!(
                name = %self.name,
                version = self.version,
                newer,
                "Closing connection on version change"
            );
            let name = self.name.clone();
            self.close();
            return Err(Error::VersionChange { name, newer });
        }

        let Self { mut conn, name, .. } = self;
        let result = Self::run(&mut conn, mode, op);
        Self::close_conn(conn, &name);
        result.map_err(map_err)
    }

    fn run<T, F>(conn: &mut Connection, mode: TransactionMode, op: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
    {
        let tx = conn.transaction_with_behavior(mode.behavior())?;
        // Dropping `tx` on error rolls back
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Close the connection explicitly
    pub fn close(self) {
        Self::close_conn(self.conn, &self.name);
    }

    fn close_conn(conn: Connection, name: &str) {
        match conn.close() {
            Ok(()) => tracing::trace!(name, "Connection closed"),
            Err((_conn, e)) => tracing::warn!(name, error = %e, "Failed to close connection"),
        }
    }
}
