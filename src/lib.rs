//! Dosewatch: medication reminder scheduling and missed-dose escalation.
//!
//! Converts a medication's "HH:mm" dose times into daily platform alarms,
//! reacts to alarm delivery, schedules a follow-up check when a dose goes
//! unacknowledged, and escalates to linked caregivers when the follow-up
//! still finds the dose unmarked.
//!
//! The engine owns no timers and no adherence truth: the platform's alarm
//! subsystem does the timing (and delivers events even while the host app is
//! backgrounded), and the surrounding app owns the adherence record. Both
//! are reached through the capability traits in `scheduler`, `adherence`,
//! `store`, `settings`, and `caregiver`, with SQLite-backed defaults for the
//! two stores this crate owns.

pub mod adherence;
pub mod caregiver;
pub mod config;
pub mod db;
pub mod engine;
pub mod escalation;
pub mod models;
pub mod scheduler;
pub mod settings;
pub mod store;
pub mod triggers;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use engine::ReminderEngine;
pub use models::{AlarmEvent, AlarmKind, AlarmTag, Medication, NotificationContent};
pub use scheduler::AlarmPlatform;
pub use triggers::{Clock, SystemClock, TriggerSpec};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for a host binary. RUST_LOG overrides the default
/// crate-level filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);
}
