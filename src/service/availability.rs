use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Result, SchedulerError};
use crate::models::slot::ResolvedRange;
use crate::service::calendar_service::CalendarClient;

pub struct AvailabilityChecker {
    calendar: Arc<dyn CalendarClient>,
}

impl AvailabilityChecker {
    pub fn new(calendar: Arc<dyn CalendarClient>) -> Self {
        Self { calendar }
    }

    /// Free iff no booking intersects `[start, end)`.
    pub async fn check_free(&self, range: &ResolvedRange) -> Result<bool> {
        self.check_free_ignoring(range, None).await
    }

    /// Same as `check_free`, except the booking with id `ignore_id` (the one
    /// being rescheduled) does not count as a conflict.
    pub async fn check_free_ignoring(
        &self,
        range: &ResolvedRange,
        ignore_id: Option<&str>,
    ) -> Result<bool> {
        debug!(
            start = %range.start.to_rfc3339(),
            end = %range.end.to_rfc3339(),
            "checking availability"
        );
        let events = self
            .calendar
            .query_events(range.start, range.end)
            .await
            .inspect_err(|err| warn!(error = %err, "availability query failed"))?;
        Ok(events
            .iter()
            .all(|event| Some(event.id.as_str()) == ignore_id))
    }

    /// A busy slot becomes `SlotTaken`; backend failures propagate and are
    /// never reported as free.
    pub async fn ensure_free_ignoring(
        &self,
        range: &ResolvedRange,
        ignore_id: Option<&str>,
    ) -> Result<()> {
        if self.check_free_ignoring(range, ignore_id).await? {
            Ok(())
        } else {
            Err(SchedulerError::SlotTaken {
                start: range.start.to_rfc3339(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::memory_calendar::MemoryCalendar;
    use crate::models::appointment::{AppointmentRecord, CreatedEvent, EventDraft};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use chrono_tz::America::Los_Angeles;
    use chrono_tz::Tz;

    struct DownCalendar;

    #[async_trait]
    impl CalendarClient for DownCalendar {
        async fn query_events(
            &self,
            _time_min: DateTime<Tz>,
            _time_max: DateTime<Tz>,
        ) -> Result<Vec<AppointmentRecord>> {
            Err(SchedulerError::Backend("connection refused".to_string()))
        }

        async fn get_event(&self, _id: &str) -> Result<AppointmentRecord> {
            Err(SchedulerError::Backend("connection refused".to_string()))
        }

        async fn create_event(&self, _draft: &EventDraft) -> Result<CreatedEvent> {
            Err(SchedulerError::Backend("connection refused".to_string()))
        }

        async fn update_event(&self, _id: &str, _draft: &EventDraft) -> Result<Option<String>> {
            Err(SchedulerError::Backend("connection refused".to_string()))
        }

        async fn delete_event(&self, _id: &str) -> Result<()> {
            Err(SchedulerError::Backend("connection refused".to_string()))
        }
    }

    fn range() -> ResolvedRange {
        ResolvedRange::new(Los_Angeles.with_ymd_and_hms(2026, 10, 20, 14, 0, 0).unwrap(), 30)
    }

    #[tokio::test]
    async fn empty_calendar_is_free() {
        let checker = AvailabilityChecker::new(Arc::new(MemoryCalendar::new()));
        assert_eq!(checker.check_free(&range()).await, Ok(true));
    }

    #[tokio::test]
    async fn overlapping_booking_is_busy_unless_ignored() {
        let calendar = Arc::new(MemoryCalendar::new());
        let booked = range();
        let created = calendar
            .create_event(&EventDraft {
                title: "existing".to_string(),
                description: String::new(),
                start: booked.start,
                end: booked.end,
            })
            .await
            .unwrap();

        let checker = AvailabilityChecker::new(calendar);
        assert_eq!(checker.check_free(&booked).await, Ok(false));
        assert!(matches!(
            checker.ensure_free_ignoring(&booked, None).await,
            Err(SchedulerError::SlotTaken { .. })
        ));
        assert_eq!(
            checker.check_free_ignoring(&booked, Some(&created.id)).await,
            Ok(true)
        );
    }

    #[tokio::test]
    async fn backend_failure_is_never_free() {
        let checker = AvailabilityChecker::new(Arc::new(DownCalendar));
        assert!(matches!(
            checker.check_free(&range()).await,
            Err(SchedulerError::Backend(_))
        ));
    }
}
