//! Scheduler: registers and cancels platform alarms for a medication's dose
//! times.
//!
//! Reschedule policy is full replace: callers cancel then schedule whenever
//! a medication's dose configuration changes. The scheduler never diffs old
//! against new configuration; wholesale replacement avoids partial-update
//! bugs when the dose count or times shift.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Medication, NotificationContent};
use crate::store::{ScheduleStore, StoreError};
use crate::triggers::{build_daily_triggers, dose_times, Clock, TriggerSpec};

/// Errors from the platform's alarm subsystem.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Alarm registration failed: {0}")]
    Registration(String),
}

/// The platform's alarm subsystem: the external scheduling authority that
/// holds registered alarms and later delivers them, potentially while the
/// application process is not running.
#[async_trait]
pub trait AlarmPlatform: Send + Sync {
    /// Register one alarm; returns the platform's id for it.
    async fn register_alarm(
        &self,
        content: &NotificationContent,
        trigger: &TriggerSpec,
    ) -> Result<String, PlatformError>;

    /// Cancel alarms by id. Best-effort and idempotent: unknown, expired, or
    /// already-cancelled ids are no-ops, never errors.
    async fn cancel_alarms(&self, ids: &[String]);
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Register daily dose alarms for a medication and persist their ids.
///
/// A medication with no derivable dose times gets no reminders and no
/// platform calls. Registration failure propagates to the caller (the
/// medication would silently receive no reminders otherwise); already
/// registered alarms from the failed batch are cancelled so a failed
/// schedule leaves nothing behind.
pub async fn schedule_reminder_notifications(
    med: &Medication,
    platform: &dyn AlarmPlatform,
    store: &dyn ScheduleStore,
    clock: &dyn Clock,
) -> Result<Vec<String>, ScheduleError> {
    let times = dose_times(med);
    if times.is_empty() {
        tracing::debug!(medication_id = %med.id, "No dose times configured, nothing to schedule");
        return Ok(Vec::new());
    }

    let triggers = build_daily_triggers(&times, clock);
    let mut ids = Vec::with_capacity(triggers.len());
    for (dose_index, trigger) in triggers.iter().enumerate() {
        let content = NotificationContent::dose(med, dose_index);
        match platform.register_alarm(&content, trigger).await {
            Ok(id) => ids.push(id),
            Err(e) => {
                platform.cancel_alarms(&ids).await;
                return Err(e.into());
            }
        }
    }

    // Storage is best-effort: the alarms exist either way, a lost id list
    // only risks missing them in a later bulk cancellation.
    if let Err(e) = store.save(&med.id, &ids).await {
        tracing::warn!(medication_id = %med.id, error = %e, "Failed to persist alarm ids");
    }

    tracing::info!(medication_id = %med.id, count = ids.len(), "Scheduled daily dose alarms");
    Ok(ids)
}

/// Cancel all outstanding alarms for a reminder and drop its stored ids.
///
/// Safe to call repeatedly and for reminders with nothing scheduled. A
/// failed load degrades to cancelling nothing rather than blocking the
/// cancel-then-schedule flow.
pub async fn cancel_reminder_notifications(
    reminder_id: &Uuid,
    platform: &dyn AlarmPlatform,
    store: &dyn ScheduleStore,
) -> Result<(), ScheduleError> {
    let ids = match store.load(reminder_id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(reminder_id = %reminder_id, error = %e, "Failed to load stored alarm ids, proceeding");
            Vec::new()
        }
    };
    if !ids.is_empty() {
        platform.cancel_alarms(&ids).await;
    }
    store.clear(reminder_id).await?;
    tracing::debug!(reminder_id = %reminder_id, cancelled = ids.len(), "Cancelled reminder notifications");
    Ok(())
}
