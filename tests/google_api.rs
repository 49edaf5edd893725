use std::time::Duration;

use appointmentBot::clients::google_calendar::GoogleCalendarClient;
use appointmentBot::clients::google_drive::GoogleDriveClient;
use appointmentBot::clients::http_client;
use appointmentBot::error::SchedulerError;
use appointmentBot::models::appointment::EventDraft;
use appointmentBot::models::office_hours::TimeOfDay;
use appointmentBot::service::calendar_service::CalendarClient;
use appointmentBot::service::office_hours_source::OfficeHoursSource;
use chrono::{NaiveDate, TimeZone, Weekday};
use chrono_tz::America::Los_Angeles;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENTS_PATH: &str = "/calendar/v3/calendars/primary/events";

fn calendar(server: &MockServer) -> GoogleCalendarClient {
    let http = http_client(Duration::from_secs(5)).unwrap();
    GoogleCalendarClient::new(http, server.uri(), "primary", "test-token", Los_Angeles)
}

fn draft() -> EventDraft {
    EventDraft {
        title: "Checkup".to_string(),
        description: "Booked by Ada".to_string(),
        start: Los_Angeles.with_ymd_and_hms(2026, 10, 20, 14, 0, 0).unwrap(),
        end: Los_Angeles.with_ymd_and_hms(2026, 10, 20, 14, 30, 0).unwrap(),
    }
}

#[tokio::test]
async fn lists_a_day_across_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(header("Authorization", "Bearer test-token"))
        .and(query_param("timeMin", "2026-10-20T00:00:00-07:00"))
        .and(query_param("timeMax", "2026-10-21T00:00:00-07:00"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "evt-1",
                "summary": "Checkup",
                "start": { "dateTime": "2026-10-20T09:00:00-07:00" },
                "end": { "dateTime": "2026-10-20T09:30:00-07:00" }
            }],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "evt-2",
                "start": { "date": "2026-10-20" },
                "end": { "date": "2026-10-21" }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let events = calendar(&server)
        .list_events_for_date(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(), Los_Angeles)
        .await
        .unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id, "evt-1");
    assert_eq!(events[0].title, "Checkup");
    assert_eq!(events[0].start.to_rfc3339(), "2026-10-20T09:00:00-07:00");
    assert_eq!(events[1].title, "(untitled)");
    assert_eq!(events[1].start.to_rfc3339(), "2026-10-20T00:00:00-07:00");
    assert_eq!(events[1].end.to_rfc3339(), "2026-10-21T00:00:00-07:00");
}

#[tokio::test]
async fn creates_event_with_zone_and_returns_link() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(EVENTS_PATH))
        .and(body_partial_json(json!({
            "summary": "Checkup",
            "description": "Booked by Ada",
            "start": {
                "dateTime": "2026-10-20T14:00:00-07:00",
                "timeZone": "America/Los_Angeles"
            },
            "end": { "dateTime": "2026-10-20T14:30:00-07:00" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt-9",
            "htmlLink": "https://calendar.google.com/event?eid=evt-9"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = calendar(&server).create_event(&draft()).await.unwrap();
    assert_eq!(created.id, "evt-9");
    assert_eq!(
        created.link.as_deref(),
        Some("https://calendar.google.com/event?eid=evt-9")
    );
}

#[tokio::test]
async fn missing_events_are_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/gone-id", EVENTS_PATH)))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/missing-id", EVENTS_PATH)))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let client = calendar(&server);
    assert_eq!(
        client.delete_event("gone-id").await,
        Err(SchedulerError::NotFound("gone-id".to_string()))
    );
    assert_eq!(
        client.update_event("missing-id", &draft()).await,
        Err(SchedulerError::NotFound("missing-id".to_string()))
    );
}

#[tokio::test]
async fn server_errors_are_backend_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let range = draft();
    match calendar(&server).query_events(range.start, range.end).await {
        Err(SchedulerError::Backend(msg)) => assert!(msg.contains("500") && msg.contains("boom")),
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_calendar_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let http = http_client(Duration::from_millis(200)).unwrap();
    let client = GoogleCalendarClient::new(http, server.uri(), "primary", "test-token", Los_Angeles);
    let range = draft();
    assert!(matches!(
        client.query_events(range.start, range.end).await,
        Err(SchedulerError::Backend(_))
    ));
}

#[tokio::test]
async fn office_hours_load_from_drive_export() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("q", "name = 'office_hours'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{ "id": "doc-1", "name": "office_hours", "mimeType": "application/vnd.google-apps.document" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/doc-1/export"))
        .and(query_param("mimeType", "text/plain"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("\u{feff}Office hours\r\nMon: 9:00am-5:00pm\r\nFri: 10:00am-2:00pm\r\n"),
        )
        .mount(&server)
        .await;

    let http = http_client(Duration::from_secs(5)).unwrap();
    let source = OfficeHoursSource::Drive {
        client: GoogleDriveClient::new(http, server.uri(), "test-token"),
        document: "office_hours".to_string(),
    };
    let hours = source.load().await.unwrap();

    let friday = hours.lookup(Weekday::Fri).unwrap();
    assert_eq!(friday.open, TimeOfDay::new(10, 0).unwrap());
    assert_eq!(friday.close, TimeOfDay::new(14, 0).unwrap());
    assert!(hours.is_open_on(Weekday::Mon));
    assert!(!hours.is_open_on(Weekday::Tue));
}

#[tokio::test]
async fn missing_drive_document_is_a_config_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": [] })))
        .mount(&server)
        .await;

    let http = http_client(Duration::from_secs(5)).unwrap();
    let client = GoogleDriveClient::new(http, server.uri(), "test-token");
    assert!(matches!(
        client.export_document_text("office_hours").await,
        Err(SchedulerError::Config(_))
    ));
}

#[tokio::test]
async fn event_ids_stay_inside_their_path_segment() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/abc", EVENTS_PATH)))
        .respond_with(ResponseTemplate::new(204))
        .with_priority(1)
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(
        calendar(&server).delete_event("abc#typo").await,
        Err(SchedulerError::NotFound("abc#typo".to_string()))
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), format!("{}/abc%23typo", EVENTS_PATH));
}

#[tokio::test]
async fn group_calendar_ids_are_encoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let http = http_client(Duration::from_secs(5)).unwrap();
    let client = GoogleCalendarClient::new(
        http,
        server.uri(),
        "en.usa#holiday@group.v.calendar.google.com",
        "test-token",
        Los_Angeles,
    );
    let range = draft();
    assert_eq!(client.query_events(range.start, range.end).await, Ok(vec![]));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests[0].url.path(),
        "/calendar/v3/calendars/en.usa%23holiday@group.v.calendar.google.com/events"
    );
    assert!(requests[0].url.query().unwrap_or_default().contains("timeMin="));
}

#[tokio::test]
async fn fetches_single_event_and_hides_cancelled_ones() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/evt-1", EVENTS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt-1",
            "summary": "Checkup",
            "status": "confirmed",
            "start": { "dateTime": "2026-10-20T14:00:00-07:00" },
            "end": { "dateTime": "2026-10-20T14:30:00-07:00" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/evt-2", EVENTS_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt-2",
            "status": "cancelled"
        })))
        .mount(&server)
        .await;

    let client = calendar(&server);
    let event = client.get_event("evt-1").await.unwrap();
    assert_eq!(event.title, "Checkup");
    assert_eq!(event.end.to_rfc3339(), "2026-10-20T14:30:00-07:00");
    assert_eq!(
        client.get_event("evt-2").await,
        Err(SchedulerError::NotFound("evt-2".to_string()))
    );
}

#[tokio::test]
async fn rejected_token_is_a_config_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Credentials"))
        .mount(&server)
        .await;

    let range = draft();
    let err = calendar(&server)
        .query_events(range.start, range.end)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Config(_)));
    assert!(!err.is_retryable());
}
