//! Shared mock collaborators for unit tests: an in-memory alarm platform,
//! schedule/settings stores, adherence source, notifier, and a pinned clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::adherence::{AdherenceError, AdherenceSource};
use crate::caregiver::{CaregiverNotifier, MissedDoseReport, NotifyError, NotifyOutcome};
use crate::models::{AdherenceDay, Frequency, Medication, NotificationContent};
use crate::scheduler::{AlarmPlatform, PlatformError};
use crate::settings::SettingsStore;
use crate::store::{ScheduleStore, StoreError};
use crate::triggers::{Clock, TriggerSpec};

/// Test medication named Amoxicillin with the given normalized dose times.
pub fn med_with_times(times: &[&str]) -> Medication {
    let frequency = match times.len() {
        1 => Some(Frequency::OnceDaily),
        2 => Some(Frequency::TwiceDaily),
        3 => Some(Frequency::ThreeTimesDaily),
        _ => None,
    };
    Medication {
        id: Uuid::new_v4(),
        name: "Amoxicillin".into(),
        dosage: "500mg".into(),
        times: Some(times.iter().map(|t| t.to_string()).collect()),
        time: None,
        frequency,
        instructions: None,
        history: Vec::new(),
    }
}

/// Pinned, settable clock.
pub struct MockClock {
    now: Mutex<NaiveDateTime>,
}

impl MockClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for MockClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

/// One alarm as the mock platform recorded it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredAlarm {
    pub id: String,
    pub content: NotificationContent,
    pub trigger: TriggerSpec,
}

/// In-memory alarm platform: hands out sequential ids and records every
/// registration and cancellation.
pub struct MockAlarmPlatform {
    alarms: Mutex<Vec<RegisteredAlarm>>,
    cancelled: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    fail_after: Mutex<Option<usize>>,
}

impl MockAlarmPlatform {
    pub fn new() -> Self {
        Self {
            alarms: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            fail_after: Mutex::new(None),
        }
    }

    /// Fail every registration after the first `n` successes.
    pub fn fail_after(&self, n: usize) {
        *self.fail_after.lock().unwrap() = Some(n);
    }

    pub fn registered(&self) -> Vec<RegisteredAlarm> {
        self.alarms.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlarmPlatform for MockAlarmPlatform {
    async fn register_alarm(
        &self,
        content: &NotificationContent,
        trigger: &TriggerSpec,
    ) -> Result<String, PlatformError> {
        let mut alarms = self.alarms.lock().unwrap();
        if let Some(limit) = *self.fail_after.lock().unwrap() {
            if alarms.len() >= limit {
                return Err(PlatformError::Registration("platform unavailable".into()));
            }
        }
        let id = format!("alarm-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        alarms.push(RegisteredAlarm {
            id: id.clone(),
            content: content.clone(),
            trigger: *trigger,
        });
        Ok(id)
    }

    async fn cancel_alarms(&self, ids: &[String]) {
        self.cancelled.lock().unwrap().extend_from_slice(ids);
    }
}

/// In-memory schedule store.
pub struct MockScheduleStore {
    map: Mutex<HashMap<Uuid, Vec<String>>>,
}

impl MockScheduleStore {
    pub fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ScheduleStore for MockScheduleStore {
    async fn save(&self, reminder_id: &Uuid, ids: &[String]) -> Result<(), StoreError> {
        self.map.lock().unwrap().insert(*reminder_id, ids.to_vec());
        Ok(())
    }

    async fn load(&self, reminder_id: &Uuid) -> Result<Vec<String>, StoreError> {
        Ok(self
            .map
            .lock()
            .unwrap()
            .get(reminder_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(&self, reminder_id: &Uuid, ids: &[String]) -> Result<(), StoreError> {
        let mut map = self.map.lock().unwrap();
        let entry = map.entry(*reminder_id).or_default();
        for id in ids {
            if !entry.contains(id) {
                entry.push(id.clone());
            }
        }
        Ok(())
    }

    async fn clear(&self, reminder_id: &Uuid) -> Result<(), StoreError> {
        self.map.lock().unwrap().remove(reminder_id);
        Ok(())
    }
}

/// In-memory settings store.
pub struct MockSettings {
    value: Mutex<Option<i64>>,
}

impl MockSettings {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    pub fn set(&self, value: Option<i64>) {
        *self.value.lock().unwrap() = value;
    }

    pub fn get(&self) -> Option<i64> {
        *self.value.lock().unwrap()
    }
}

#[async_trait]
impl SettingsStore for MockSettings {
    async fn follow_up_delay_minutes(&self) -> Result<Option<i64>, StoreError> {
        Ok(self.get())
    }

    async fn set_follow_up_delay_minutes(&self, minutes: i64) -> Result<(), StoreError> {
        self.set(Some(minutes));
        Ok(())
    }
}

/// In-memory medication/adherence source.
pub struct MockAdherence {
    meds: Mutex<HashMap<Uuid, Medication>>,
}

impl MockAdherence {
    pub fn new() -> Self {
        Self {
            meds: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, med: Medication) {
        self.meds.lock().unwrap().insert(med.id, med);
    }

    /// Mark one dose taken on a date, growing that day's taken array to
    /// `dose_count` as the app would.
    pub fn mark_taken(&self, med_id: &Uuid, date: NaiveDate, dose_index: usize, dose_count: usize) {
        let mut meds = self.meds.lock().unwrap();
        let med = meds.get_mut(med_id).expect("medication not inserted");
        let idx = match med.history.iter().position(|d| d.date == date) {
            Some(i) => i,
            None => {
                med.history.push(AdherenceDay {
                    date,
                    taken: vec![false; dose_count],
                });
                med.history.len() - 1
            }
        };
        let day = &mut med.history[idx];
        if day.taken.len() < dose_count {
            day.taken.resize(dose_count, false);
        }
        day.taken[dose_index] = true;
    }
}

#[async_trait]
impl AdherenceSource for MockAdherence {
    async fn medication(&self, med_id: &Uuid) -> Result<Option<Medication>, AdherenceError> {
        Ok(self.meds.lock().unwrap().get(med_id).cloned())
    }
}

/// Recording caregiver notifier.
pub struct MockNotifier {
    reports: Mutex<Vec<MissedDoseReport>>,
    fail_next: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn reports(&self) -> Vec<MissedDoseReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaregiverNotifier for MockNotifier {
    async fn report_missed_dose(
        &self,
        report: &MissedDoseReport,
    ) -> Result<NotifyOutcome, NotifyError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(NotifyError::Status { code: 500 });
        }
        self.reports.lock().unwrap().push(report.clone());
        Ok(NotifyOutcome::Reported { notified: 1 })
    }
}
