//! Slot generation from a schedule definition.
//!
//! Given a schedule (weekly working-hour template, per-date overrides, slot
//! length) and a target date in the schedule's timezone, produce the
//! ordered list of bookable slots plus day-level metadata. Slots are
//! derived, stateless, and recomputed per view - no cross-date memoization.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use fernhill_core::ScheduleId;

/// A working-hours window within one day, in the schedule's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

/// Weekly working-hour template. Absent days are closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyHours {
    #[serde(default)]
    pub monday: Option<DayWindow>,
    #[serde(default)]
    pub tuesday: Option<DayWindow>,
    #[serde(default)]
    pub wednesday: Option<DayWindow>,
    #[serde(default)]
    pub thursday: Option<DayWindow>,
    #[serde(default)]
    pub friday: Option<DayWindow>,
    #[serde(default)]
    pub saturday: Option<DayWindow>,
    #[serde(default)]
    pub sunday: Option<DayWindow>,
}

impl WeeklyHours {
    /// The template window for a weekday.
    #[must_use]
    pub const fn for_weekday(&self, weekday: Weekday) -> Option<DayWindow> {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}

/// A date-specific exception: extended/reduced hours or a full closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOverride {
    pub date: NaiveDate,
    /// Replacement window; ignored when `closed` is set.
    #[serde(default)]
    pub window: Option<DayWindow>,
    #[serde(default)]
    pub closed: bool,
    /// Display note (e.g., "Bank holiday").
    #[serde(default)]
    pub note: Option<String>,
}

/// A schedule definition, read-only from this service's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDef {
    pub id: ScheduleId,
    pub name: String,
    pub timezone: Tz,
    /// Slot length in minutes.
    pub slot_minutes: u32,
    pub weekly: WeeklyHours,
    #[serde(default)]
    pub overrides: Vec<DateOverride>,
}

impl ScheduleDef {
    /// The override applying to a date, if any.
    #[must_use]
    pub fn override_for(&self, date: NaiveDate) -> Option<&DateOverride> {
        self.overrides.iter().find(|o| o.date == date)
    }
}

/// A single bookable increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Local-time display label ("09:15").
    pub label: String,
    pub available: bool,
    /// Remaining capacity; `None` means unlimited.
    #[serde(default)]
    pub remaining: Option<u32>,
}

/// One day's slots plus day-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub open: bool,
    /// Why the day is closed, when it is.
    #[serde(default)]
    pub reason: Option<String>,
    /// Override display note, when one applies.
    #[serde(default)]
    pub note: Option<String>,
    pub slots: Vec<Slot>,
}

impl DaySlots {
    fn closed(date: NaiveDate, reason: String, note: Option<String>) -> Self {
        Self {
            date,
            open: false,
            reason: Some(reason),
            note,
            slots: Vec::new(),
        }
    }
}

/// Generate the slots for a date.
///
/// An explicit per-date override takes precedence over the weekly template;
/// a closed override or an absent weekday window yields an empty list with
/// `open = false` and a reason. The window is partitioned into fixed
/// `slot_minutes` increments (a trailing partial increment is dropped). A
/// slot is unavailable once its start has passed `now` or its remaining
/// capacity (when tracking is supplied) is exhausted; absent capacity means
/// unlimited.
#[must_use]
pub fn slots_for_date(
    schedule: &ScheduleDef,
    date: NaiveDate,
    now: DateTime<Utc>,
    remaining: Option<&HashMap<NaiveTime, u32>>,
) -> DaySlots {
    let mut note = None;

    let window = if let Some(date_override) = schedule.override_for(date) {
        note = date_override.note.clone();
        if date_override.closed {
            let reason = date_override
                .note
                .clone()
                .unwrap_or_else(|| "Closed".to_string());
            return DaySlots::closed(date, reason, note);
        }
        match date_override.window {
            Some(window) => window,
            // An open override with no window falls back to the template.
            None => match schedule.weekly.for_weekday(date.weekday()) {
                Some(window) => window,
                None => {
                    return DaySlots::closed(
                        date,
                        format!("Closed on {}", weekday_name(date.weekday())),
                        note,
                    );
                }
            },
        }
    } else {
        match schedule.weekly.for_weekday(date.weekday()) {
            Some(window) => window,
            None => {
                return DaySlots::closed(
                    date,
                    format!("Closed on {}", weekday_name(date.weekday())),
                    note,
                );
            }
        }
    };

    if schedule.slot_minutes == 0 {
        return DaySlots::closed(date, "Schedule has no slot length".to_string(), note);
    }

    let slot_seconds = schedule.slot_minutes * 60;
    let open_seconds = window.open.num_seconds_from_midnight();
    let close_seconds = window.close.num_seconds_from_midnight();

    let mut slots = Vec::new();
    let mut start_seconds = open_seconds;
    while start_seconds + slot_seconds <= close_seconds {
        let end_seconds = start_seconds + slot_seconds;
        if let Some(slot) = build_slot(
            schedule.timezone,
            date,
            start_seconds,
            end_seconds,
            now,
            remaining,
        ) {
            slots.push(slot);
        }
        start_seconds = end_seconds;
    }

    DaySlots {
        date,
        open: true,
        reason: None,
        note,
        slots,
    }
}

/// Resolve one increment to a concrete slot.
///
/// Returns `None` for local times the timezone cannot represent (the
/// skipped hour of a DST spring-forward).
fn build_slot(
    tz: Tz,
    date: NaiveDate,
    start_seconds: u32,
    end_seconds: u32,
    now: DateTime<Utc>,
    remaining: Option<&HashMap<NaiveTime, u32>>,
) -> Option<Slot> {
    let start_local = NaiveTime::from_num_seconds_from_midnight_opt(start_seconds, 0)?;
    let end_local = NaiveTime::from_num_seconds_from_midnight_opt(end_seconds, 0)?;

    let start_time = resolve_local(tz, date, start_local)?;
    let end_time = resolve_local(tz, date, end_local)?;

    let slot_remaining = remaining.and_then(|map| map.get(&start_local).copied());
    let available = start_time > now && slot_remaining != Some(0);

    Some(Slot {
        start_time: start_time.with_timezone(&Utc),
        end_time: end_time.with_timezone(&Utc),
        label: start_local.format("%H:%M").to_string(),
        available,
        remaining: slot_remaining,
    })
}

/// Resolve a local wall-clock time in a timezone.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; skipped
/// times (DST spring-forward) resolve to `None`.
fn resolve_local(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&date.and_time(time)) {
        chrono::LocalResult::Single(dt) => Some(dt),
        chrono::LocalResult::Ambiguous(earliest, _) => Some(earliest),
        chrono::LocalResult::None => None,
    }
}

const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
