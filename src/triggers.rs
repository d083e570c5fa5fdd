//! Time/Trigger Builder: converts wall-clock "HH:mm" dose times into concrete
//! next-occurrence trigger specifications.
//!
//! All instants here are local wall-clock `NaiveDateTime`s. The platform's
//! alarm subsystem interprets them in the device timezone; keeping them naive
//! makes the roll-to-tomorrow logic exact and keeps the builder testable with
//! a pinned clock.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::models::Medication;

/// Source of "now" for next-occurrence computation. Injectable so tests can
/// pin the clock (e.g. register at 23:59 and assert the 08:00 slot rolls to
/// tomorrow).
pub trait Clock: Send + Sync {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the device's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A validated wall-clock dose time (hour 0-23, minute 0-59).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoseTime {
    hour: u8,
    minute: u8,
}

impl DoseTime {
    /// Returns `None` for out-of-range values.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    fn to_naive_time(self) -> NaiveTime {
        // Range validated in `new`.
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

/// What the platform needs to register one alarm: the next fire instant and
/// whether it re-fires at the same wall-clock time every following day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSpec {
    pub fire_at: NaiveDateTime,
    pub repeats_daily: bool,
}

/// Parse one "HH:mm" token. Malformed or out-of-range tokens yield `None`.
pub fn parse_hh_mm(token: &str) -> Option<DoseTime> {
    let token = token.trim();
    let (h, m) = token.split_once(':')?;
    let hour: u8 = h.trim().parse().ok()?;
    let minute: u8 = m.trim().parse().ok()?;
    DoseTime::new(hour, minute)
}

/// Parse "HH:mm, HH:mm, ..." into dose times. Accepts "08:00,20:00" and
/// "08:00, 20:00". Malformed entries are silently dropped, not errored.
pub fn parse_times_csv(raw: &str) -> Vec<DoseTime> {
    raw.split(',')
        .filter_map(|token| {
            let token = token.trim();
            if token.is_empty() {
                return None;
            }
            let parsed = parse_hh_mm(token);
            if parsed.is_none() {
                tracing::debug!(token, "Dropping malformed dose time");
            }
            parsed
        })
        .collect()
}

/// Derive a medication's dose times: prefer the normalized `times` list,
/// fall back to the legacy CSV `time` field. An empty result is a valid
/// zero-schedule state, not an error.
pub fn dose_times(med: &Medication) -> Vec<DoseTime> {
    if let Some(times) = &med.times {
        let parsed: Vec<DoseTime> = times.iter().filter_map(|t| parse_hh_mm(t)).collect();
        if !parsed.is_empty() {
            return parsed;
        }
    }
    med.time.as_deref().map(parse_times_csv).unwrap_or_default()
}

/// Build one daily-repeating trigger per dose time: today at that time if
/// still strictly in the future, otherwise the same time tomorrow.
pub fn build_daily_triggers(times: &[DoseTime], clock: &dyn Clock) -> Vec<TriggerSpec> {
    let now = clock.now();
    times
        .iter()
        .map(|t| {
            let mut fire_at = now.date().and_time(t.to_naive_time());
            if fire_at <= now {
                fire_at = fire_at + Duration::days(1);
            }
            TriggerSpec {
                fire_at,
                repeats_daily: true,
            }
        })
        .collect()
}

/// One-shot trigger `delay_minutes` from now, used for follow-up checks.
pub fn follow_up_trigger(now: NaiveDateTime, delay_minutes: i64) -> TriggerSpec {
    TriggerSpec {
        fire_at: now + Duration::minutes(delay_minutes),
        repeats_daily: false,
    }
}
