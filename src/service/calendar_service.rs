use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;

use crate::error::{Result, SchedulerError};
use crate::models::appointment::{AppointmentRecord, CreatedEvent, EventDraft};

/// Event store the scheduler books against.
///
/// `query_events` returns every single occurrence intersecting
/// `[time_min, time_max)`, ordered by start time.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    async fn query_events(
        &self,
        time_min: DateTime<Tz>,
        time_max: DateTime<Tz>,
    ) -> Result<Vec<AppointmentRecord>>;

    /// `NotFound` when no live event has this id.
    async fn get_event(&self, id: &str) -> Result<AppointmentRecord>;

    async fn create_event(&self, draft: &EventDraft) -> Result<CreatedEvent>;

    /// Returns the event link when the backend provides one.
    async fn update_event(&self, id: &str, draft: &EventDraft) -> Result<Option<String>>;

    async fn delete_event(&self, id: &str) -> Result<()>;

    /// Events of one local calendar day in `timezone`.
    async fn list_events_for_date(
        &self,
        date: NaiveDate,
        timezone: Tz,
    ) -> Result<Vec<AppointmentRecord>> {
        let (start, end) = day_bounds(date, timezone)?;
        self.query_events(start, end).await
    }
}

/// Local midnight of `date` and of the following day.
pub fn day_bounds(date: NaiveDate, timezone: Tz) -> Result<(DateTime<Tz>, DateTime<Tz>)> {
    let midnight = |d: NaiveDate| {
        // a zone may skip midnight; its first instant is then the earliest valid one
        let naive = d.and_time(chrono::NaiveTime::MIN);
        timezone
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| timezone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
            .ok_or_else(|| {
                SchedulerError::Format(format!("no local midnight on {} in {}", d, timezone.name()))
            })
    };
    let next = date
        .succ_opt()
        .ok_or_else(|| SchedulerError::Parse(format!("{} is out of range", date)))?;
    Ok((midnight(date)?, midnight(next)?))
}
