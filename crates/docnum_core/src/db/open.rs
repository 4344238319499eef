//! Opening numbering databases.
//!
//! Every connection handed out here is migrated, enforces foreign keys and
//! waits at most `DbOptions::busy_timeout` for the write lock. File databases
//! additionally run in WAL mode so previews can read while an allocation
//! holds the lock.

use super::migrations::apply_migrations;
use super::{DbOptions, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Opens (or creates) the database file with [`DbOptions::default`].
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_options(path, &DbOptions::default())
}

/// Opens a SQLite database file using explicit connection options.
///
/// Every worker that allocates numbers concurrently should hold its own
/// connection from this function; SQLite serializes the writers.
pub fn open_db_with_options(path: impl AsRef<Path>, options: &DbOptions) -> DbResult<Connection> {
    bootstrap("file", || Connection::open(path), options)
}

/// Opens a private in-memory database; it disappears with the connection.
pub fn open_db_in_memory() -> DbResult<Connection> {
    bootstrap("memory", Connection::open_in_memory, &DbOptions::default())
}

fn bootstrap(
    mode: &str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
    options: &DbOptions,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
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

    match configure_connection(&mut conn, mode, options) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} busy_timeout_ms={} duration_ms={}",
                mode,
                options.busy_timeout.as_millis(),
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

fn configure_connection(conn: &mut Connection, mode: &str, options: &DbOptions) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(options.busy_timeout)?;
    if options.wal && mode == "file" {
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        if !journal_mode.eq_ignore_ascii_case("wal") {
            info!(
                "event=db_open module=db status=ok mode={mode} journal_mode={journal_mode} note=wal_unavailable"
            );
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
    }
    apply_migrations(conn)?;
    Ok(())
}
