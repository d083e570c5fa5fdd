//! Delivery Correlator / Escalation State Machine.
//!
//! Reacts to alarm delivery events. A dose alarm whose dose is not yet
//! marked taken schedules a one-shot follow-up check; a follow-up whose dose
//! is still not taken escalates to the caregiver notifier.
//!
//! There is deliberately no persistent state record of this machine's own:
//! on every event the state is re-derived from the adherence record (the
//! external source of truth) plus the event's kind. Stale local state can
//! therefore never desync from what the user actually logged. The cost is
//! at-least-once rather than exactly-once escalation: a redelivered dose
//! event can schedule a second follow-up, and consumers of caregiver alerts
//! must tolerate duplicates.

use thiserror::Error;

use crate::adherence::{AdherenceError, AdherenceSource};
use crate::caregiver::{CaregiverNotifier, MissedDoseReport, NotifyOutcome};
use crate::models::{dose_taken, AlarmEvent, AlarmKind, NotificationContent};
use crate::scheduler::{AlarmPlatform, PlatformError};
use crate::settings::{effective_follow_up_delay, SettingsStore};
use crate::store::ScheduleStore;
use crate::triggers::{follow_up_trigger, Clock};

#[derive(Error, Debug)]
pub enum EscalationError {
    #[error(transparent)]
    Adherence(#[from] AdherenceError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Everything the delivery handler touches, as borrowed capabilities.
///
/// Both the foreground and the background delivery registration points
/// forward into `handle_alarm_event` with the same capability set, so the
/// escalation logic runs identically in either lifecycle and is unit
/// testable without a real alarm platform.
pub struct EventCapabilities<'a> {
    pub adherence: &'a dyn AdherenceSource,
    pub settings: &'a dyn SettingsStore,
    pub platform: &'a dyn AlarmPlatform,
    pub store: &'a dyn ScheduleStore,
    pub notifier: &'a dyn CaregiverNotifier,
    pub clock: &'a dyn Clock,
}

/// Handle one delivered alarm.
///
/// Dose kind: taken means done; not taken schedules a follow-up check after
/// the configured delay. Followup kind: taken means the user self-resolved;
/// not taken escalates to caregivers exactly once for this event (notifier
/// failure is logged and swallowed, never retried).
pub async fn handle_alarm_event(
    event: &AlarmEvent,
    caps: &EventCapabilities<'_>,
) -> Result<(), EscalationError> {
    let tag = &event.tag;

    let Some(med) = caps.adherence.medication(&tag.med_id).await? else {
        // Deleted between registration and delivery; its alarms are stale.
        tracing::debug!(med_id = %tag.med_id, "Alarm delivered for unknown medication, ignoring");
        return Ok(());
    };

    let now = caps.clock.now();
    let today = now.date();
    let taken = dose_taken(&med.history, today, tag.dose_index);

    match tag.kind {
        AlarmKind::Dose => {
            if taken {
                // Logged ahead of the alarm; nothing to chase.
                tracing::debug!(med_id = %med.id, dose_index = tag.dose_index, "Dose already taken");
                return Ok(());
            }

            let raw_delay = match caps.settings.follow_up_delay_minutes().await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read follow-up delay, using default");
                    None
                }
            };
            let delay = effective_follow_up_delay(raw_delay);

            let content = NotificationContent::follow_up(&med, tag.dose_index);
            let trigger = follow_up_trigger(now, delay);
            let id = caps.platform.register_alarm(&content, &trigger).await?;

            // Best-effort: a lost id only escapes later bulk cancellation.
            if let Err(e) = caps.store.append(&med.id, &[id.clone()]).await {
                tracing::warn!(med_id = %med.id, alarm_id = %id, error = %e, "Failed to record follow-up alarm id");
            }

            tracing::info!(
                med_id = %med.id,
                dose_index = tag.dose_index,
                delay_minutes = delay,
                "Dose unacknowledged, follow-up check scheduled"
            );
        }
        AlarmKind::Followup => {
            if taken {
                tracing::info!(med_id = %med.id, dose_index = tag.dose_index, "Dose taken before follow-up, no escalation");
                return Ok(());
            }

            let report = MissedDoseReport {
                med_id: med.id,
                med_name: med.name.clone(),
                dose_date: today,
                dose_index: tag.dose_index,
            };
            match caps.notifier.report_missed_dose(&report).await {
                Ok(NotifyOutcome::Reported { notified }) => {
                    tracing::info!(med_id = %med.id, dose_index = tag.dose_index, notified, "Missed dose escalated to caregivers");
                }
                Ok(NotifyOutcome::SkippedUnauthenticated) => {
                    tracing::debug!(med_id = %med.id, "Caregiver alert skipped, no signed-in user");
                }
                Err(e) => {
                    // The missed dose already happened; one attempt is the contract.
                    tracing::warn!(med_id = %med.id, dose_index = tag.dose_index, error = %e, "Caregiver alert failed");
                }
            }
        }
    }

    Ok(())
}
