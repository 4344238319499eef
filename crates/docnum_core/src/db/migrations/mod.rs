//! Embedded schema steps for the numbering database.
//!
//! Steps are applied in order inside one immediate transaction and the
//! reached step is stored in `PRAGMA user_version`. Two processes opening the
//! same file at once serialize on that transaction; the loser re-reads the
//! version and finds nothing left to do.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "sequence_counters",
        sql: include_str!("0001_sequence_counters.sql"),
    },
    SchemaStep {
        version: 2,
        name: "numbering_templates",
        sql: include_str!("0002_numbering_templates.sql"),
    },
];

/// Schema version this build writes and expects.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.iter().map(|step| step.version).max().unwrap_or(0)
}

/// Brings the connection's schema up to [`latest_version`].
///
/// Fails with [`DbError::UnsupportedSchemaVersion`] when the file was written
/// by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let target = latest_version();
    if is_up_to_date(current_user_version(conn)?, target)? {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from = current_user_version(&tx)?;
    if is_up_to_date(from, target)? {
        return Ok(());
    }

    for step in SCHEMA_STEPS.iter().filter(|step| step.version > from) {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        info!(
            "event=db_migrate module=db status=ok version={} step={}",
            step.version, step.name
        );
    }
    tx.commit()?;
    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

fn is_up_to_date(current: u32, target: u32) -> DbResult<bool> {
    match current.cmp(&target) {
        std::cmp::Ordering::Greater => Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: target,
        }),
        std::cmp::Ordering::Equal => Ok(true),
        std::cmp::Ordering::Less => Ok(false),
    }
}
