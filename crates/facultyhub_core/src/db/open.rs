//! Connection bootstrap utilities for the records database.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure pragmas the reconciliation transaction relies on.
//! - Run schema migrations before handing out a connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections wait up to [`BUSY_TIMEOUT`] for a competing writer.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// How long a writer waits for another request's transaction to finish.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the records database file and applies all pending migrations.
///
/// Each request-handling worker is expected to own its connection; SQLite's
/// file locking serializes their write transactions.
///
/// # Side effects
/// - Emits `db_open` events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        error!("event=db_open module=db status=error mode=file error_code=empty_path");
        return Err(DbError::EmptyPath);
    }

    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");
    finish_open(Connection::open(path), "file", started_at)
}

/// Opens an in-memory records database with all migrations applied.
///
/// Used by tests and by one-shot tooling.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");
    finish_open(Connection::open_in_memory(), "memory", started_at)
}

fn finish_open(
    opened: rusqlite::Result<Connection>,
    mode: &'static str,
    started_at: Instant,
) -> DbResult<Connection> {
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}
