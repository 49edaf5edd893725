//! Google Calendar v3 client.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clients::api_url;
use crate::error::{Result, SchedulerError};
use crate::models::appointment::{AppointmentRecord, CreatedEvent, EventDraft};
use crate::service::calendar_service::{CalendarClient, day_bounds};

pub const GOOGLE_API_BASE: &str = "https://www.googleapis.com";

pub struct GoogleCalendarClient {
    http: Client,
    api_base: String,
    calendar_id: String,
    access_token: String,
    timezone: Tz,
}

impl GoogleCalendarClient {
    pub fn new(
        http: Client,
        api_base: impl Into<String>,
        calendar_id: impl Into<String>,
        access_token: impl Into<String>,
        timezone: Tz,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            calendar_id: calendar_id.into(),
            access_token: access_token.into(),
            timezone,
        }
    }

    fn events_url(&self) -> Result<Url> {
        api_url(
            &self.api_base,
            &["calendar", "v3", "calendars", self.calendar_id.as_str(), "events"],
        )
    }

    fn event_url(&self, id: &str) -> Result<Url> {
        api_url(
            &self.api_base,
            &["calendar", "v3", "calendars", self.calendar_id.as_str(), "events", id],
        )
    }

    fn body<'a>(&self, draft: &'a EventDraft) -> GoogleEventBody<'a> {
        let at = |instant: &DateTime<Tz>| GoogleEventTime {
            date_time: Some(instant.to_rfc3339()),
            date: None,
            time_zone: Some(self.timezone.name().to_string()),
        };
        GoogleEventBody {
            summary: &draft.title,
            description: &draft.description,
            start: at(&draft.start),
            end: at(&draft.end),
        }
    }

    fn to_record(&self, event: GoogleCalendarEvent) -> Result<AppointmentRecord> {
        let GoogleCalendarEvent {
            id, summary, start, end, ..
        } = event;
        let start = self.instant(&id, start)?;
        let end = self.instant(&id, end)?;
        Ok(AppointmentRecord {
            title: summary
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "(untitled)".to_string()),
            id,
            start,
            end,
        })
    }

    /// Timed events carry `dateTime`; all-day events only a `date`, whose end
    /// is exclusive.
    fn instant(&self, id: &str, time: GoogleEventTime) -> Result<DateTime<FixedOffset>> {
        if let Some(raw) = time.date_time {
            return DateTime::parse_from_rfc3339(&raw).map_err(|e| {
                SchedulerError::Backend(format!("event {}: bad dateTime '{}': {}", id, raw, e))
            });
        }
        let raw = time
            .date
            .ok_or_else(|| SchedulerError::Backend(format!("event {} has no start/end", id)))?;
        let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
            SchedulerError::Backend(format!("event {}: bad date '{}': {}", id, raw, e))
        })?;
        let (midnight, _) = day_bounds(date, self.timezone)?;
        Ok(midnight.fixed_offset())
    }

    async fn send(&self, request: reqwest::RequestBuilder, id: Option<&str>) -> Result<Response> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        check_status(response, id).await
    }
}

async fn check_status(response: Response, id: Option<&str>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let Some(id) = id {
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(SchedulerError::NotFound(id.to_string()));
        }
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        warn!(%status, "google calendar rejected the access token");
        return Err(SchedulerError::Config(format!(
            "Google Calendar rejected GOOGLE_ACCESS_TOKEN ({})",
            status
        )));
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    warn!(%status, "google calendar request failed");
    Err(SchedulerError::Backend(format!(
        "Google Calendar API error ({}): {}",
        status, body
    )))
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    async fn query_events(
        &self,
        time_min: DateTime<Tz>,
        time_max: DateTime<Tz>,
    ) -> Result<Vec<AppointmentRecord>> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let response = self
                .send(self.http.get(self.events_url()?).query(&params), None)
                .await?;
            let page: GoogleEventsResponse = response.json().await.map_err(|e| {
                SchedulerError::Backend(format!("Failed to parse Google response: {}", e))
            })?;

            for event in page.items {
                records.push(self.to_record(event)?);
            }
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(records)
    }

    async fn get_event(&self, id: &str) -> Result<AppointmentRecord> {
        let response = self.send(self.http.get(self.event_url(id)?), Some(id)).await?;
        let event: GoogleCalendarEvent = response.json().await.map_err(|e| {
            SchedulerError::Backend(format!("Failed to parse event {}: {}", id, e))
        })?;
        // deleted events stay readable by id until purged
        if event.status.as_deref() == Some("cancelled") {
            return Err(SchedulerError::NotFound(id.to_string()));
        }
        self.to_record(event)
    }

    async fn create_event(&self, draft: &EventDraft) -> Result<CreatedEvent> {
        let response = self
            .send(self.http.post(self.events_url()?).json(&self.body(draft)), None)
            .await?;
        let created: GoogleCalendarEvent = response.json().await.map_err(|e| {
            SchedulerError::Backend(format!("Failed to parse created event: {}", e))
        })?;
        info!(event_id = %created.id, start = %draft.start.to_rfc3339(), "created calendar event");
        Ok(CreatedEvent {
            id: created.id,
            link: created.html_link,
        })
    }

    async fn update_event(&self, id: &str, draft: &EventDraft) -> Result<Option<String>> {
        let response = self
            .send(self.http.put(self.event_url(id)?).json(&self.body(draft)), Some(id))
            .await?;
        let updated: GoogleCalendarEvent = response.json().await.map_err(|e| {
            SchedulerError::Backend(format!("Failed to parse updated event: {}", e))
        })?;
        info!(event_id = id, start = %draft.start.to_rfc3339(), "updated calendar event");
        Ok(updated.html_link)
    }

    async fn delete_event(&self, id: &str) -> Result<()> {
        self.send(self.http.delete(self.event_url(id)?), Some(id)).await?;
        info!(event_id = id, "deleted calendar event");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct GoogleEventBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: GoogleEventTime,
    end: GoogleEventTime,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleEventsResponse {
    #[serde(default)]
    items: Vec<GoogleCalendarEvent>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleCalendarEvent {
    id: String,
    summary: Option<String>,
    status: Option<String>,
    #[serde(default)]
    start: GoogleEventTime,
    #[serde(default)]
    end: GoogleEventTime,
    #[serde(rename = "htmlLink")]
    html_link: Option<String>,
}
