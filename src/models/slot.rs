use std::fmt;

use chrono::{DateTime, Duration, Weekday};
use chrono_tz::Tz;

use crate::error::{Result, SchedulerError};
use crate::models::office_hours::TimeOfDay;

pub const DEFAULT_SLOT_MINUTES: u32 = 30;

/// A requested weekday + time, not yet tied to a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateSlot {
    pub weekday: Weekday,
    pub time: TimeOfDay,
    pub duration_minutes: u32,
}

impl CandidateSlot {
    /// Parses user input shaped like `Tue 2:00pm`.
    pub fn parse(input: &str, duration_minutes: u32) -> Result<Self> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let [day, time] = tokens.as_slice() else {
            return Err(SchedulerError::Parse(format!(
                "expected '<day> <time>' such as 'Tue 2:00pm', got '{}'",
                input.trim()
            )));
        };
        let weekday: Weekday = day
            .parse()
            .map_err(|_| SchedulerError::InvalidDay(format!("'{}' is not a weekday", day)))?;
        let time = TimeOfDay::parse_12h(time)?;
        Ok(Self {
            weekday,
            time,
            duration_minutes,
        })
    }
}

/// Absolute start/end of a slot in the session timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl ResolvedRange {
    pub fn new(start: DateTime<Tz>, duration_minutes: u32) -> Self {
        let end = start + Duration::minutes(i64::from(duration_minutes));
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
