use std::fmt;

use chrono::{NaiveTime, Weekday};
use tracing::warn;

use crate::error::{Result, SchedulerError};

const TIME_FORMAT_HINT: &str = "expected H:MMam or H:MMpm, e.g. 2:00pm";

/// Wall-clock time with minute precision. Field order makes the derived
/// ordering the same as comparing minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    /// Parses a 12-hour clock token such as `2:00pm`, `09:30AM` or `12:15 am`.
    pub fn parse_12h(input: &str) -> Result<Self> {
        let lower = input.trim().to_ascii_lowercase();
        let bad = || SchedulerError::Format(format!("'{}': {}", input.trim(), TIME_FORMAT_HINT));

        let (clock, is_pm) = if let Some(clock) = lower.strip_suffix("am") {
            (clock, false)
        } else if let Some(clock) = lower.strip_suffix("pm") {
            (clock, true)
        } else {
            return Err(bad());
        };

        let (hour_str, minute_str) = clock.trim_end().split_once(':').ok_or_else(bad)?;
        let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if !digits(hour_str) || hour_str.len() > 2 || !digits(minute_str) || minute_str.len() != 2 {
            return Err(bad());
        }

        let hour: u8 = hour_str.parse().map_err(|_| bad())?;
        let minute: u8 = minute_str.parse().map_err(|_| bad())?;
        if !(1..=12).contains(&hour) || minute > 59 {
            return Err(bad());
        }

        let hour = match (hour, is_pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        // hour/minute are range-checked on construction
        NaiveTime::from_hms_opt(self.hour.into(), self.minute.into(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        use chrono::Timelike;
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hour12 = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        let marker = if self.hour < 12 { "am" } else { "pm" };
        write!(f, "{}:{:02}{}", hour12, self.minute, marker)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningHours {
    pub open: TimeOfDay,
    pub close: TimeOfDay,
}

impl OpeningHours {
    /// Closed on both ends: the published closing time is itself bookable.
    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.open <= time && time <= self.close
    }
}

/// Weekly office hours, indexed by days from Monday. A `None` day is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyHours {
    days: [Option<OpeningHours>; 7],
}

impl WeeklyHours {
    /// Builds the table from lines shaped like `<anything> <Weekday>: <open>-<close>`.
    ///
    /// Lines without a colon are skipped. Any colon-bearing line must name one
    /// of the seven weekdays and carry exactly one `-` separated time pair.
    pub fn parse(text: &str) -> Result<Self> {
        let mut hours = WeeklyHours::default();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let clean = line
                .trim_start_matches('\u{feff}')
                .replace('\r', "");
            let clean = clean.trim();
            let Some((day_part, times)) = clean.split_once(':') else {
                continue;
            };

            let day_token = day_part.split_whitespace().last().ok_or_else(|| {
                SchedulerError::Parse(format!("line {}: missing weekday before ':'", line_no))
            })?;
            let day: Weekday = day_token.parse().map_err(|_| {
                SchedulerError::Parse(format!(
                    "line {}: '{}' is not a weekday",
                    line_no, day_token
                ))
            })?;

            let parts: Vec<&str> = times.split('-').collect();
            let [open, close] = parts.as_slice() else {
                return Err(SchedulerError::Parse(format!(
                    "line {}: expected '<open>-<close>', got '{}'",
                    line_no,
                    times.trim()
                )));
            };
            let parse_time = |raw: &str| {
                TimeOfDay::parse_12h(raw).map_err(|e| {
                    SchedulerError::Parse(format!("line {}: {}", line_no, e))
                })
            };
            let open = parse_time(*open)?;
            let close = parse_time(*close)?;
            if open > close {
                return Err(SchedulerError::Parse(format!(
                    "line {}: {} opens at {} but closes at {}",
                    line_no, day, open, close
                )));
            }

            let slot = &mut hours.days[day.num_days_from_monday() as usize];
            if slot.is_some() {
                warn!(line = line_no, %day, "duplicate office hours entry, later line wins");
            }
            *slot = Some(OpeningHours { open, close });
        }

        if hours.open_days().next().is_none() {
            warn!("office hours table has no open days");
        }
        Ok(hours)
    }

    pub fn lookup(&self, day: Weekday) -> Option<OpeningHours> {
        self.days[day.num_days_from_monday() as usize]
    }

    pub fn is_open_on(&self, day: Weekday) -> bool {
        self.lookup(day).is_some()
    }

    /// Open days in Monday-first order.
    pub fn open_days(&self) -> impl Iterator<Item = (Weekday, OpeningHours)> + '_ {
        let mut day = Weekday::Mon;
        (0..7).filter_map(move |i| {
            let current = day;
            day = day.succ();
            self.days[i].map(|h| (current, h))
        })
    }
}

impl fmt::Display for WeeklyHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (day, hours) in self.open_days() {
            writeln!(f, "{}: {} to {}", day, hours.open, hours.close)?;
        }
        Ok(())
    }
}
