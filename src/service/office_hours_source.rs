use std::path::PathBuf;

use tracing::info;

use crate::clients::google_drive::GoogleDriveClient;
use crate::error::{Result, SchedulerError};
use crate::models::office_hours::WeeklyHours;

/// Where the weekly office hours text comes from.
pub enum OfficeHoursSource {
    File(PathBuf),
    Drive {
        client: GoogleDriveClient,
        document: String,
    },
}

impl OfficeHoursSource {
    pub async fn load_text(&self) -> Result<String> {
        match self {
            OfficeHoursSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                SchedulerError::Config(format!(
                    "cannot read office hours from {}: {}",
                    path.display(),
                    e
                ))
            }),
            OfficeHoursSource::Drive { client, document } => {
                client.export_document_text(document).await
            }
        }
    }

    pub async fn load(&self) -> Result<WeeklyHours> {
        let text = self.load_text().await?;
        let hours = WeeklyHours::parse(&text)?;
        info!(open_days = hours.open_days().count(), "loaded office hours");
        Ok(hours)
    }
}
