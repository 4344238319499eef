//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections shared by counters and templates.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories refuse connections whose schema is not fully migrated.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_db_with_options};

pub type DbResult<T> = Result<T, DbError>;

/// Default time a connection waits on a locked database before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection tuning applied during bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbOptions {
    /// Upper bound for waiting on another writer. Expiry surfaces as a
    /// retryable busy error instead of blocking forever.
    pub busy_timeout: Duration,
    /// Switches file databases to WAL so readers never wait on writers.
    pub wal: bool,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            wal: true,
        }
    }
}

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    SchemaNotReady {
        db_version: u32,
        expected: u32,
    },
}

impl DbError {
    /// Returns true when the failure is lock contention or a busy timeout.
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Sqlite(err) => is_busy_error(err),
            _ => false,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::SchemaNotReady {
                db_version,
                expected,
            } => write!(
                f,
                "database schema version {db_version} does not match expected {expected}; open it through db::open_db"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::SchemaNotReady { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Returns true when SQLite reported `SQLITE_BUSY` or `SQLITE_LOCKED`.
pub fn is_busy_error(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
    )
}

/// Verifies that `conn` has every known migration applied.
///
/// Used by repository constructors so a raw, unmigrated connection is
/// rejected up front instead of failing on the first query.
pub fn ensure_schema_ready(conn: &rusqlite::Connection) -> DbResult<()> {
    let db_version = migrations::current_user_version(conn)?;
    let expected = migrations::latest_version();
    if db_version != expected {
        return Err(DbError::SchemaNotReady {
            db_version,
            expected,
        });
    }
    Ok(())
}
