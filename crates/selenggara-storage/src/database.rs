// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::time::Duration;

use selenggara_core::SelenggaraError;
use tracing::{debug, info};

use crate::migrations;

/// How long a statement waits on a lock held by another process
/// (e.g. `selenggara repair` running next to the server).
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the SQLite database.
///
/// Cloning is cheap; every clone talks to the same background thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Opens (creating if needed) the database at `path`, applies PRAGMAs and
    /// runs pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, SelenggaraError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| SelenggaraError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_open_err)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        info!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Opens a private in-memory database with the full schema. Used by tests.
    pub async fn open_in_memory() -> Result<Self, SelenggaraError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(map_open_err)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    /// Opens an existing database without running migrations or changing
    /// the journal mode. Used by `doctor`.
    pub async fn open_read_only(path: &str) -> Result<Self, SelenggaraError> {
        let conn = tokio_rusqlite::Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .await
        .map_err(map_open_err)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> { conn.busy_timeout(BUSY_TIMEOUT) })
            .await
            .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Highest applied migration version, or `None` for an unmigrated file.
    pub async fn schema_version(&self) -> Result<Option<i64>, SelenggaraError> {
        self.conn
            .call(|conn| -> Result<Option<i64>, rusqlite::Error> {
                migrations::applied_version(conn)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), SelenggaraError> {
        self.conn
            .call(move |conn| -> Result<Result<(), SelenggaraError>, rusqlite::Error> {
                conn.busy_timeout(BUSY_TIMEOUT)?;
                conn.pragma_update(None, "foreign_keys", true)?;
                if wal_mode {
                    let mode: String = conn.pragma_update_and_check(
                        None,
                        "journal_mode",
                        "WAL",
                        |row| row.get(0),
                    )?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                    debug!(journal_mode = %mode, "journal mode set");
                }
                Ok(migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// The single tokio-rusqlite connection all queries go through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Runs `SELECT 1` to prove the connection is usable.
    pub async fn ping(&self) -> Result<(), SelenggaraError> {
        self.conn
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT 1", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(())
    }

    /// Folds the WAL back into the main database file.
    pub async fn checkpoint(&self) -> Result<(), SelenggaraError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Opening a connection fails with a plain rusqlite error.
fn map_open_err(e: rusqlite::Error) -> SelenggaraError {
    SelenggaraError::Storage {
        source: Box::new(e),
    }
}

/// Convert tokio-rusqlite errors to `SelenggaraError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> SelenggaraError {
    SelenggaraError::Storage {
        source: Box::new(e),
    }
}
