//! Per-user follow-up delay configuration.
//!
//! The raw stored value is whatever the user last saved (possibly from an
//! older app version under the legacy nested key); reads go through
//! `effective_follow_up_delay` so a missing or nonsensical value always
//! degrades to the 60-minute default instead of breaking escalation.

use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::{FOLLOW_UP_DELAY_DEFAULT, FOLLOW_UP_DELAY_MAX, FOLLOW_UP_DELAY_MIN};
use crate::store::StoreError;

const DELAY_KEY: &str = "followUpDelayMinutes";
/// Older app versions nested the value under a settings object.
const LEGACY_DELAY_KEY: &str = "settings.followUpDelayMinutes";

/// Read/write access to the user's follow-up delay configuration.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Raw stored value, `None` when never configured.
    async fn follow_up_delay_minutes(&self) -> Result<Option<i64>, StoreError>;

    /// Persist a delay value. Callers clamp before writing.
    async fn set_follow_up_delay_minutes(&self, minutes: i64) -> Result<(), StoreError>;
}

/// Clamp a requested delay to the supported range [1, 720].
pub fn clamp_follow_up_delay(minutes: i64) -> i64 {
    minutes.clamp(FOLLOW_UP_DELAY_MIN, FOLLOW_UP_DELAY_MAX)
}

/// Effective delay for scheduling a follow-up: the stored value when it is
/// positive, otherwise the 60-minute default.
pub fn effective_follow_up_delay(raw: Option<i64>) -> i64 {
    match raw {
        Some(minutes) if minutes > 0 => clamp_follow_up_delay(minutes),
        _ => FOLLOW_UP_DELAY_DEFAULT,
    }
}

/// SQLite-backed settings store over the `settings` key/value table.
pub struct SqliteSettingsStore {
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn read_key(conn: &Connection, key: &str) -> Result<Option<i64>, StoreError> {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.and_then(|v| v.trim().parse().ok()))
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn follow_up_delay_minutes(&self) -> Result<Option<i64>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".into()))?;
        if let Some(minutes) = Self::read_key(&conn, DELAY_KEY)? {
            return Ok(Some(minutes));
        }
        Self::read_key(&conn, LEGACY_DELAY_KEY)
    }

    async fn set_follow_up_delay_minutes(&self, minutes: i64) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".into()))?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![DELAY_KEY, minutes.to_string()],
        )?;
        Ok(())
    }
}
