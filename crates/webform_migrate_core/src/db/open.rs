//! Connection bootstrap for the legacy store.
//!
//! # Responsibility
//! - Open file snapshots read-only or build an in-memory store.
//! - Verify the legacy schema before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have passed `verify_legacy_schema`.

use super::schema::{install_legacy_schema, verify_legacy_schema};
use super::DbResult;
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a legacy SQLite snapshot read-only.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_legacy_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = match Connection::open_with_flags(path, flags) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    finish_open(conn, "file", started_at, |conn| {
        conn.busy_timeout(Duration::from_secs(5))?;
        verify_legacy_schema(conn)
    })
}

/// Creates an empty in-memory legacy store with the component table installed.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_legacy_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let conn = match Connection::open_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    finish_open(conn, "memory", started_at, |conn| {
        install_legacy_schema(conn)?;
        verify_legacy_schema(conn)
    })
}

fn finish_open(
    conn: Connection,
    mode: &str,
    started_at: Instant,
    bootstrap: impl FnOnce(&Connection) -> DbResult<()>,
) -> DbResult<Connection> {
    match bootstrap(&conn) {
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
