//! Durable sequence counters.
//!
//! # Responsibility
//! - Atomically increment-and-fetch a counter, creating it on first use.
//! - Read a counter without mutating it.
//!
//! # Invariants
//! - N concurrent increments of one key observe exactly N distinct
//!   consecutive values.
//! - An increment either commits and returns the new value, or rolls back
//!   and returns an error. A committed value is never swallowed.
//! - Counter rows are never decremented or deleted.

use crate::db::{ensure_schema_ready, is_busy_error, DbError};
use crate::model::counter::CounterKey;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CounterResult<T> = Result<T, CounterStoreError>;

/// Counter operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterOperation {
    Increment,
    Peek,
}

impl CounterOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Peek => "peek",
        }
    }
}

/// Counter store failure.
#[derive(Debug)]
pub enum CounterStoreError {
    /// Storage was busy, locked or timed out. Nothing was mutated and the
    /// caller may retry with backoff.
    Unavailable {
        operation: CounterOperation,
        source: DbError,
    },
    /// Any other storage failure.
    Db(DbError),
    /// A stored value violates counter invariants.
    InvalidData(String),
}

impl CounterStoreError {
    /// Returns whether retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    fn from_sqlite(operation: CounterOperation, err: rusqlite::Error) -> Self {
        if is_busy_error(&err) {
            Self::Unavailable {
                operation,
                source: DbError::Sqlite(err),
            }
        } else {
            Self::Db(DbError::Sqlite(err))
        }
    }
}

impl Display for CounterStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { operation, source } => write!(
                f,
                "counter store unavailable during {}: {source}",
                operation.as_str()
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid counter data: {message}"),
        }
    }
}

impl Error for CounterStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for CounterStoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Durable counter contract used by the numbering engine.
///
/// Implementations must make `increment` a single storage-level atomic
/// operation; a read followed by a separate write is not acceptable.
pub trait CounterStore {
    /// Creates the counter at 0 if absent, adds one and returns the new value.
    fn increment(&self, key: &CounterKey) -> CounterResult<u64>;
    /// Returns the stored value, or 0 when the counter does not exist yet.
    fn peek(&self, key: &CounterKey) -> CounterResult<u64>;
}

impl<C: CounterStore + ?Sized> CounterStore for &C {
    fn increment(&self, key: &CounterKey) -> CounterResult<u64> {
        (**self).increment(key)
    }

    fn peek(&self, key: &CounterKey) -> CounterResult<u64> {
        (**self).peek(key)
    }
}

/// SQLite-backed counter store over `sequence_counters`.
///
/// Each worker thread should own its own connection; the database write lock
/// orders concurrent increments, not an in-process mutex.
pub struct SqliteCounterStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCounterStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> CounterResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn increment_in(tx: &Transaction<'_>, key: &CounterKey) -> rusqlite::Result<i64> {
        tx.query_row(
            "INSERT INTO sequence_counters (tenant_id, document_type, period_key, value)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT (tenant_id, document_type, period_key) DO UPDATE SET
                value = value + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             RETURNING value;",
            params![
                key.tenant_id.as_str(),
                key.document_type.as_str(),
                key.period_key.as_str()
            ],
            |row| row.get(0),
        )
    }
}

impl CounterStore for SqliteCounterStore<'_> {
    fn increment(&self, key: &CounterKey) -> CounterResult<u64> {
        let op = CounterOperation::Increment;
        // IMMEDIATE takes the write lock up front, so contention surfaces
        // here (bounded by busy_timeout) instead of mid-statement.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| CounterStoreError::from_sqlite(op, err))?;

        let raw = Self::increment_in(&tx, key)
            .map_err(|err| CounterStoreError::from_sqlite(op, err))?;
        let value = to_counter_value(raw, key)?;

        // The value only counts as issued once the commit is durable.
        if let Err(err) = tx.commit() {
            warn!(
                "event=counter_increment module=counter status=error error_code=commit_failed key={} error={}",
                key, err
            );
            return Err(CounterStoreError::from_sqlite(op, err));
        }

        debug!("event=counter_increment module=counter status=ok key={key} value={value}");
        Ok(value)
    }

    fn peek(&self, key: &CounterKey) -> CounterResult<u64> {
        let raw = self
            .conn
            .query_row(
                "SELECT value
                 FROM sequence_counters
                 WHERE tenant_id = ?1 AND document_type = ?2 AND period_key = ?3;",
                params![
                    key.tenant_id.as_str(),
                    key.document_type.as_str(),
                    key.period_key.as_str()
                ],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map_err(|err| CounterStoreError::from_sqlite(CounterOperation::Peek, err))?;

        match raw {
            Some(raw) => to_counter_value(raw, key),
            None => Ok(0),
        }
    }
}

fn to_counter_value(raw: i64, key: &CounterKey) -> CounterResult<u64> {
    u64::try_from(raw).map_err(|_| {
        CounterStoreError::InvalidData(format!("negative counter value {raw} for {key}"))
    })
}
