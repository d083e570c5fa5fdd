//! `ReminderEngine`: the single shared object a host application wires the
//! engine's collaborators into.
//!
//! Wrapped in `Arc` at startup and handed to every delivery registration
//! point (foreground and background), which all forward into the same
//! `handle_alarm_event`.

use std::sync::Arc;

use uuid::Uuid;

use crate::adherence::AdherenceSource;
use crate::caregiver::CaregiverNotifier;
use crate::escalation::{handle_alarm_event, EscalationError, EventCapabilities};
use crate::models::{AlarmEvent, Medication};
use crate::scheduler::{
    cancel_reminder_notifications, schedule_reminder_notifications, AlarmPlatform, ScheduleError,
};
use crate::settings::{clamp_follow_up_delay, effective_follow_up_delay, SettingsStore};
use crate::store::{ScheduleStore, StoreError};
use crate::triggers::Clock;

/// Reminder scheduling and missed-dose escalation engine.
pub struct ReminderEngine {
    platform: Arc<dyn AlarmPlatform>,
    store: Arc<dyn ScheduleStore>,
    settings: Arc<dyn SettingsStore>,
    adherence: Arc<dyn AdherenceSource>,
    notifier: Arc<dyn CaregiverNotifier>,
    clock: Arc<dyn Clock>,
}

impl ReminderEngine {
    pub fn new(
        platform: Arc<dyn AlarmPlatform>,
        store: Arc<dyn ScheduleStore>,
        settings: Arc<dyn SettingsStore>,
        adherence: Arc<dyn AdherenceSource>,
        notifier: Arc<dyn CaregiverNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            platform,
            store,
            settings,
            adherence,
            notifier,
            clock,
        }
    }

    /// Register daily dose alarms for a medication; returns the platform ids.
    ///
    /// Callers reschedule by `cancel_reminder_notifications` followed by this,
    /// whenever a medication's dose configuration changes.
    pub async fn schedule_reminder_notifications(
        &self,
        med: &Medication,
    ) -> Result<Vec<String>, ScheduleError> {
        schedule_reminder_notifications(
            med,
            self.platform.as_ref(),
            self.store.as_ref(),
            self.clock.as_ref(),
        )
        .await
    }

    /// Cancel all outstanding alarms for a reminder (dose and follow-up alike).
    pub async fn cancel_reminder_notifications(
        &self,
        reminder_id: &Uuid,
    ) -> Result<(), ScheduleError> {
        cancel_reminder_notifications(reminder_id, self.platform.as_ref(), self.store.as_ref())
            .await
    }

    /// Persist a follow-up delay, clamped to [1, 720] minutes. Returns the
    /// value actually stored.
    pub async fn set_follow_up_delay_minutes(&self, minutes: i64) -> Result<i64, StoreError> {
        let clamped = clamp_follow_up_delay(minutes);
        self.settings.set_follow_up_delay_minutes(clamped).await?;
        tracing::info!(requested = minutes, stored = clamped, "Follow-up delay updated");
        Ok(clamped)
    }

    /// Effective follow-up delay in minutes (default 60 when unconfigured).
    pub async fn follow_up_delay_minutes(&self) -> Result<i64, StoreError> {
        let raw = self.settings.follow_up_delay_minutes().await?;
        Ok(effective_follow_up_delay(raw))
    }

    /// Entry point for delivered alarms. Hosts register this once at process
    /// start for both foreground and background delivery.
    pub async fn handle_alarm_event(&self, event: &AlarmEvent) -> Result<(), EscalationError> {
        let caps = EventCapabilities {
            adherence: self.adherence.as_ref(),
            settings: self.settings.as_ref(),
            platform: self.platform.as_ref(),
            store: self.store.as_ref(),
            notifier: self.notifier.as_ref(),
            clock: self.clock.as_ref(),
        };
        handle_alarm_event(event, &caps).await
    }
}
