/// Database module for the school records store

mod types;

pub mod academics;
pub mod admissions;
pub mod communication;
pub mod dashboard;
pub mod staff;
pub mod students;
pub mod timetable;

pub use types::*;

use crate::error::SchoolResult;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::info;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_school.sql");

pub struct SchoolDbManager {
    db: Mutex<Connection>,
}

impl SchoolDbManager {
    /// Opens (or creates) the database at `db_path` and applies the schema
    pub fn open(db_path: &str) -> rusqlite::Result<Self> {
        info!("Opening school database at {}", db_path);
        Self::from_connection(Connection::open(db_path)?)
    }

    /// A private in-memory database, used by tests
    pub fn in_memory() -> rusqlite::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves no open transaction behind,
        // so the connection is still consistent.
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs read-only work against the connection
    pub fn read<T, F>(&self, f: F) -> SchoolResult<T>
    where
        F: FnOnce(&Connection) -> SchoolResult<T>,
    {
        let db = self.lock();
        f(&*db)
    }

    /// Runs work inside an immediate transaction, committed only if `f` succeeds
    pub fn write<T, F>(&self, f: F) -> SchoolResult<T>
    where
        F: FnOnce(&Connection) -> SchoolResult<T>,
    {
        let mut db = self.lock();
        let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&*tx)?;
        tx.commit()?;
        Ok(out)
    }
}

/// Checks whether a row with the given id exists in `table`
pub(crate) fn row_exists(conn: &Connection, table: &'static str, id: &str) -> SchoolResult<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id = ?1"),
            [id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Counts rows in `table` whose `column` equals `value`
pub(crate) fn count_where(
    conn: &Connection,
    table: &'static str,
    column: &'static str,
    value: &str,
) -> SchoolResult<i64> {
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1"),
        [value],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Deletes a row by id, returning whether anything was removed
pub(crate) fn delete_by_id(conn: &Connection, table: &'static str, id: &str) -> SchoolResult<bool> {
    let removed = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])?;
    Ok(removed > 0)
}
