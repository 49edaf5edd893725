use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{Result, SchedulerError};
use crate::models::office_hours::{TimeOfDay, WeeklyHours};
use crate::models::slot::{CandidateSlot, ResolvedRange};

/// Next calendar date on or after `now` that falls on `weekday`. When today
/// is the target day and the requested time is not still ahead, the slot
/// moves to the same weekday next week.
pub fn resolve_next_occurrence(now: &DateTime<Tz>, weekday: Weekday, time: TimeOfDay) -> NaiveDate {
    let current = i64::from(now.weekday().num_days_from_monday());
    let target = i64::from(weekday.num_days_from_monday());
    let mut days_ahead = (target - current).rem_euclid(7);
    if days_ahead == 0 && TimeOfDay::from(now.time()) >= time {
        days_ahead += 7;
    }
    now.date_naive() + Duration::days(days_ahead)
}

/// Attaches `timezone` to `date` + `time` and extends it by the slot length.
pub fn build_range(
    date: NaiveDate,
    time: TimeOfDay,
    duration_minutes: u32,
    timezone: Tz,
) -> Result<ResolvedRange> {
    let start = localize(date, time, timezone)?;
    Ok(ResolvedRange::new(start, duration_minutes))
}

pub fn validate_against_office_hours(weekday: Weekday, time: TimeOfDay, hours: &WeeklyHours) -> bool {
    hours
        .lookup(weekday)
        .is_some_and(|opening| opening.contains(time))
}

/// Checks the absolute start against the office window of the resolved date.
/// Uses the same closed `[open, close]` boundary as the time-of-day check.
pub fn validate_within_window(range: &ResolvedRange, hours: &WeeklyHours) -> bool {
    let Some(opening) = hours.lookup(range.start.weekday()) else {
        return false;
    };
    let date = range.start.date_naive();
    let timezone = range.start.timezone();
    let (Ok(open), Ok(close)) = (
        localize(date, opening.open, timezone),
        localize(date, opening.close, timezone),
    ) else {
        return false;
    };
    open <= range.start && range.start <= close
}

fn localize(date: NaiveDate, time: TimeOfDay, timezone: Tz) -> Result<DateTime<Tz>> {
    let naive = date.and_time(time.to_naive_time());
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| {
            SchedulerError::Format(format!(
                "{} does not exist on {} in {}",
                time,
                date,
                timezone.name()
            ))
        })
}

/// Turns a requested weekday + time into a bookable absolute range.
#[derive(Debug, Clone)]
pub struct SlotResolver<'a> {
    hours: &'a WeeklyHours,
    timezone: Tz,
    slot_minutes: u32,
}

impl<'a> SlotResolver<'a> {
    pub fn new(hours: &'a WeeklyHours, timezone: Tz, slot_minutes: u32) -> Self {
        Self {
            hours,
            timezone,
            slot_minutes,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn parse_candidate(&self, input: &str) -> Result<CandidateSlot> {
        CandidateSlot::parse(input, self.slot_minutes)
    }

    pub fn resolve(&self, now: DateTime<Utc>, slot: &CandidateSlot) -> Result<ResolvedRange> {
        if !self.hours.is_open_on(slot.weekday) {
            return Err(SchedulerError::InvalidDay(format!(
                "the office is closed on {}",
                slot.weekday
            )));
        }
        if !validate_against_office_hours(slot.weekday, slot.time, self.hours) {
            return Err(outside_hours(slot));
        }

        let now_local = now.with_timezone(&self.timezone);
        let date = resolve_next_occurrence(&now_local, slot.weekday, slot.time);
        let range = build_range(date, slot.time, slot.duration_minutes, self.timezone)?;
        if !validate_within_window(&range, self.hours) {
            return Err(outside_hours(slot));
        }

        debug!(
            start = %range.start.to_rfc3339(),
            end = %range.end.to_rfc3339(),
            "resolved candidate slot"
        );
        Ok(range)
    }

    /// Parse and resolve in one step, e.g. `"Tue 2:00pm"`.
    pub fn resolve_input(&self, now: DateTime<Utc>, input: &str) -> Result<ResolvedRange> {
        let slot = self.parse_candidate(input)?;
        self.resolve(now, &slot)
    }
}

fn outside_hours(slot: &CandidateSlot) -> SchedulerError {
    SchedulerError::OutsideOfficeHours {
        day: slot.weekday.to_string(),
        time: slot.time.to_string(),
    }
}
