use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Result, SchedulerError};
use crate::models::appointment::{AppointmentRecord, CreatedEvent, EventDraft};
use crate::service::calendar_service::CalendarClient;

/// In-process calendar with the same query semantics as the remote one.
#[derive(Debug, Default)]
pub struct MemoryCalendar {
    events: Mutex<HashMap<String, AppointmentRecord>>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<AppointmentRecord> {
        self.events.lock().await.get(id).cloned()
    }

    fn record(id: String, draft: &EventDraft) -> AppointmentRecord {
        AppointmentRecord {
            id,
            title: draft.title.clone(),
            start: draft.start.fixed_offset(),
            end: draft.end.fixed_offset(),
        }
    }
}

fn overlaps(event: &AppointmentRecord, min: DateTime<FixedOffset>, max: DateTime<FixedOffset>) -> bool {
    event.start < max && event.end > min
}

#[async_trait]
impl CalendarClient for MemoryCalendar {
    async fn query_events(
        &self,
        time_min: DateTime<Tz>,
        time_max: DateTime<Tz>,
    ) -> Result<Vec<AppointmentRecord>> {
        let (min, max) = (time_min.fixed_offset(), time_max.fixed_offset());
        let events = self.events.lock().await;
        let mut found: Vec<AppointmentRecord> = events
            .values()
            .filter(|event| overlaps(event, min, max))
            .cloned()
            .collect();
        found.sort_by_key(|event| event.start);
        Ok(found)
    }

    async fn get_event(&self, id: &str) -> Result<AppointmentRecord> {
        self.get(id)
            .await
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))
    }

    async fn create_event(&self, draft: &EventDraft) -> Result<CreatedEvent> {
        let id = Uuid::new_v4().simple().to_string();
        let mut events = self.events.lock().await;
        events.insert(id.clone(), Self::record(id.clone(), draft));
        Ok(CreatedEvent { id, link: None })
    }

    async fn update_event(&self, id: &str, draft: &EventDraft) -> Result<Option<String>> {
        let mut events = self.events.lock().await;
        let Some(existing) = events.get_mut(id) else {
            return Err(SchedulerError::NotFound(id.to_string()));
        };
        *existing = Self::record(id.to_string(), draft);
        Ok(None)
    }

    async fn delete_event(&self, id: &str) -> Result<()> {
        let mut events = self.events.lock().await;
        events
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))
    }
}
