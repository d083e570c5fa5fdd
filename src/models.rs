//! Domain types shared across the scheduling and escalation modules.
//!
//! `Medication` (including its adherence history) is owned by the surrounding
//! application; this crate only reads it. The alarm types (`AlarmTag`,
//! `AlarmEvent`, `NotificationContent`) are the contract with the platform's
//! alarm subsystem: every registered alarm carries a tag, and the same tag
//! comes back attached to the delivery event.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ═══════════════════════════════════════════
// Medication (read-only to this crate)
// ═══════════════════════════════════════════

/// How many doses per day a medication expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "Once daily")]
    OnceDaily,
    #[serde(rename = "Twice daily")]
    TwiceDaily,
    #[serde(rename = "Three times daily")]
    ThreeTimesDaily,
}

impl Frequency {
    /// Expected dose count per day.
    pub fn expected_doses(&self) -> usize {
        match self {
            Self::OnceDaily => 1,
            Self::TwiceDaily => 2,
            Self::ThreeTimesDaily => 3,
        }
    }
}

/// One day of adherence history: which of the day's expected doses were
/// marked taken. The taken array should match the day's expected dose count,
/// but readers must tolerate a shorter or missing array (missing = not taken).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdherenceDay {
    pub date: NaiveDate,
    pub taken: Vec<bool>,
}

/// A configured medication entry whose dose times generate alarms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    pub dosage: String,
    /// Normalized dose times, each "HH:mm" in 24h form, e.g. ["08:00","20:00"].
    /// Preferred source for scheduling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub times: Option<Vec<String>>,
    /// Legacy comma-separated times, e.g. "08:00, 20:00". Kept for backwards
    /// compatibility with entries created by older app versions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Per-day adherence records, owned and written by the surrounding app.
    #[serde(default)]
    pub history: Vec<AdherenceDay>,
}

/// Whether `dose_index` was marked taken on `date`.
///
/// Missing day, short taken-array, or out-of-range index all read as
/// not-taken. The adherence source of truth is external and may lag the
/// day's expected dose count.
pub fn dose_taken(history: &[AdherenceDay], date: NaiveDate, dose_index: usize) -> bool {
    history
        .iter()
        .find(|day| day.date == date)
        .and_then(|day| day.taken.get(dose_index).copied())
        .unwrap_or(false)
}

// ═══════════════════════════════════════════
// Alarm contract with the platform
// ═══════════════════════════════════════════

/// Which leg of the escalation protocol an alarm belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmKind {
    /// Primary daily-repeating reminder for a configured dose time.
    Dose,
    /// One-shot check scheduled after an unacknowledged dose alarm.
    Followup,
}

/// Metadata attached to every registered alarm and carried back verbatim on
/// delivery. This is the only channel by which a delivered alarm is
/// correlated to a medication and dose slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmTag {
    pub kind: AlarmKind,
    pub med_id: Uuid,
    /// Zero-based position within the day's ordered dose times.
    pub dose_index: usize,
}

/// A platform notification-delivery event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub tag: AlarmTag,
}

/// User-visible content of a registered alarm plus its correlation tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub tag: AlarmTag,
}

impl NotificationContent {
    /// Content for a primary dose alarm. Instructions override the default
    /// body; otherwise the body names the dose slot and dosage.
    pub fn dose(med: &Medication, dose_index: usize) -> Self {
        let body = match &med.instructions {
            Some(instructions) => instructions.clone(),
            None if med.dosage.is_empty() => format!("Dose {}", dose_index + 1),
            None => format!("Dose {} - {}", dose_index + 1, med.dosage),
        };
        Self {
            title: format!("Time to take {}", med.name),
            body,
            tag: AlarmTag {
                kind: AlarmKind::Dose,
                med_id: med.id,
                dose_index,
            },
        }
    }

    /// Content for a follow-up check alarm.
    pub fn follow_up(med: &Medication, dose_index: usize) -> Self {
        Self {
            title: format!("Did you take {}?", med.name),
            body: format!("Dose {} has not been marked as taken yet", dose_index + 1),
            tag: AlarmTag {
                kind: AlarmKind::Followup,
                med_id: med.id,
                dose_index,
            },
        }
    }
}
