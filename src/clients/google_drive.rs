use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::clients::api_url;
use crate::error::{Result, SchedulerError};

/// Exports Google Docs as plain text by file name.
pub struct GoogleDriveClient {
    http: Client,
    api_base: String,
    access_token: String,
}

impl GoogleDriveClient {
    pub fn new(http: Client, api_base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Text of the first document named exactly `name`.
    pub async fn export_document_text(&self, name: &str) -> Result<String> {
        let query = format!("name = '{}'", name.replace('\\', "\\\\").replace('\'', "\\'"));
        let response = self
            .http
            .get(api_url(&self.api_base, &["drive", "v3", "files"])?)
            .bearer_auth(&self.access_token)
            .query(&[("q", query.as_str()), ("fields", "files(id, name, mimeType)")])
            .send()
            .await?;
        let listing: DriveFileList = read_json(response, "file search").await?;

        let Some(file) = listing.files.into_iter().next() else {
            return Err(SchedulerError::Config(format!(
                "no document named '{}' found in Drive",
                name
            )));
        };
        debug!(file_id = %file.id, mime_type = ?file.mime_type, "exporting office hours document");

        let response = self
            .http
            .get(api_url(&self.api_base, &["drive", "v3", "files", file.id.as_str(), "export"])?)
            .bearer_auth(&self.access_token)
            .query(&[("mimeType", "text/plain")])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(%status, "drive export failed");
            return Err(SchedulerError::Backend(format!(
                "Drive export failed ({}): {}",
                status, text
            )));
        }
        Ok(text)
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response, what: &str) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        warn!(%status, what, "drive request failed");
        return Err(SchedulerError::Backend(format!(
            "Drive {} failed ({}): {}",
            what, status, text
        )));
    }
    serde_json::from_str(&text)
        .map_err(|e| SchedulerError::Backend(format!("Failed to parse Drive {}: {}", what, e)))
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
}
