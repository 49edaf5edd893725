pub mod google_calendar;
pub mod google_drive;
pub mod memory_calendar;
pub mod openai_client;

use std::time::Duration;

use reqwest::Url;

use crate::error::{Result, SchedulerError};

/// Shared HTTP client; every collaborator call is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| SchedulerError::Config(format!("cannot build HTTP client: {}", e)))
}

/// `base` followed by `segments`, each percent-encoded as a single path
/// segment so ids containing `/`, `?` or `#` stay inside their segment.
pub fn api_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| SchedulerError::Config(format!("invalid API base '{}': {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| SchedulerError::Config(format!("API base '{}' cannot take a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
