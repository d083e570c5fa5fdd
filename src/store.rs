//! Schedule Store: the per-reminder list of outstanding platform alarm ids.
//!
//! This crate is the only writer to these records. They exist so alarms can
//! be cancelled or replaced later, including follow-up alarms scheduled long
//! after the process that registered them has restarted, which is why the
//! default implementation is a durable SQLite table rather than process
//! memory.

use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use thiserror::Error;
use uuid::Uuid;

/// Errors from schedule-store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Keyed store for the alarm ids registered per reminder.
///
/// One injectable interface instead of ad hoc key strings scattered through
/// the scheduling code; mockable in tests.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Replace the stored id list for a reminder.
    async fn save(&self, reminder_id: &Uuid, ids: &[String]) -> Result<(), StoreError>;

    /// Stored ids for a reminder, empty if none.
    async fn load(&self, reminder_id: &Uuid) -> Result<Vec<String>, StoreError>;

    /// Union additional ids onto the existing stored list. Used when a
    /// follow-up alarm is added after the primary alarms already exist.
    async fn append(&self, reminder_id: &Uuid, ids: &[String]) -> Result<(), StoreError>;

    /// Remove the stored list entirely.
    async fn clear(&self, reminder_id: &Uuid) -> Result<(), StoreError>;
}

/// SQLite-backed schedule store, durable across app restarts.
///
/// Ids are normalized to one row per (reminder, alarm) with a UNIQUE
/// constraint, so a racing `append` degrades to a duplicate-ignored insert
/// rather than clobbering a concurrent writer's ids.
pub struct SqliteScheduleStore {
    conn: Mutex<Connection>,
}

impl SqliteScheduleStore {
    /// Wrap an already-opened connection (see `db::open_database`).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl ScheduleStore for SqliteScheduleStore {
    async fn save(&self, reminder_id: &Uuid, ids: &[String]) -> Result<(), StoreError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".into()))?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM alarm_registrations WHERE reminder_id = ?1",
            params![reminder_id.to_string()],
        )?;
        for id in ids {
            tx.execute(
                "INSERT OR IGNORE INTO alarm_registrations (reminder_id, alarm_id) VALUES (?1, ?2)",
                params![reminder_id.to_string(), id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn load(&self, reminder_id: &Uuid) -> Result<Vec<String>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".into()))?;
        let mut stmt = conn.prepare(
            "SELECT alarm_id FROM alarm_registrations WHERE reminder_id = ?1 ORDER BY rowid",
        )?;
        let ids = stmt
            .query_map(params![reminder_id.to_string()], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    async fn append(&self, reminder_id: &Uuid, ids: &[String]) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".into()))?;
        for id in ids {
            conn.execute(
                "INSERT OR IGNORE INTO alarm_registrations (reminder_id, alarm_id) VALUES (?1, ?2)",
                params![reminder_id.to_string(), id],
            )?;
        }
        Ok(())
    }

    async fn clear(&self, reminder_id: &Uuid) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".into()))?;
        conn.execute(
            "DELETE FROM alarm_registrations WHERE reminder_id = ?1",
            params![reminder_id.to_string()],
        )?;
        Ok(())
    }
}
