use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::clients::google_calendar::GoogleCalendarClient;
use crate::clients::google_drive::GoogleDriveClient;
use crate::clients::http_client;
use crate::clients::memory_calendar::MemoryCalendar;
use crate::config::{AppConfig, CalendarBackend, Settings};
use crate::error::Result;
use crate::handlers::dialogue::{Clock, Dialogue, DialogueSettings};
use crate::handlers::terminal::InquireTerminal;
use crate::models::office_hours::WeeklyHours;
use crate::service::availability::AvailabilityChecker;
use crate::service::calendar_service::CalendarClient;
use crate::service::office_hours_source::OfficeHoursSource;
use crate::service::openai_service::OpenAIService;
use crate::service::slot_resolver::SlotResolver;

#[derive(Parser)]
#[command(name = "appointmentBot", about = "Conversational appointment scheduling against office hours")]
pub struct Cli {
    /// KEY=VALUE config file; falls back to $CONFIG_FILE
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive booking session (default)
    Chat,
    /// Print the office hours table
    Hours,
    /// Resolve and check one slot, e.g. `check Tue 2:00pm`
    Check { day: String, time: String },
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = match cli.config.or_else(|| std::env::var("CONFIG_FILE").ok()) {
        Some(path) => AppConfig::from_file(&path)?,
        None => AppConfig::default(),
    };
    let settings = Settings::from_config(&config)?;
    let http = http_client(settings.http_timeout)?;

    let hours = office_hours_source(&settings, &http)?.load().await?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Hours => {
            print!("{}", hours);
            Ok(())
        }
        Commands::Check { day, time } => {
            let calendar = calendar_client(&settings, &http)?;
            check_slot(&settings, &hours, calendar, &format!("{} {}", day, time)).await
        }
        Commands::Chat => {
            let calendar = calendar_client(&settings, &http)?;
            let openai = Arc::new(OpenAIService::new(
                http.clone(),
                settings.openai_base_url.clone(),
                settings.require_openai_key()?.to_string(),
                settings.openai_model.clone(),
            ));
            let mut dialogue = Dialogue::new(
                openai,
                calendar,
                hours,
                DialogueSettings {
                    timezone: settings.timezone,
                    slot_minutes: settings.slot_minutes,
                    max_attempts: settings.max_attempts,
                },
                Clock::System,
            );
            dialogue.run(&mut InquireTerminal).await;
            info!(actions = dialogue.outcomes().len(), "session ended");
            Ok(())
        }
    }
}

fn office_hours_source(settings: &Settings, http: &reqwest::Client) -> Result<OfficeHoursSource> {
    if let Some(path) = &settings.office_hours_file {
        return Ok(OfficeHoursSource::File(path.clone()));
    }
    Ok(OfficeHoursSource::Drive {
        client: GoogleDriveClient::new(
            http.clone(),
            settings.google_api_base.clone(),
            settings.require_google_token()?,
        ),
        document: settings.office_hours_doc.clone(),
    })
}

fn calendar_client(settings: &Settings, http: &reqwest::Client) -> Result<Arc<dyn CalendarClient>> {
    let calendar: Arc<dyn CalendarClient> = match settings.calendar_backend {
        CalendarBackend::Memory => Arc::new(MemoryCalendar::new()),
        CalendarBackend::Google => Arc::new(GoogleCalendarClient::new(
            http.clone(),
            settings.google_api_base.clone(),
            settings.google_calendar_id.clone(),
            settings.require_google_token()?,
            settings.timezone,
        )),
    };
    Ok(calendar)
}

async fn check_slot(
    settings: &Settings,
    hours: &WeeklyHours,
    calendar: Arc<dyn CalendarClient>,
    input: &str,
) -> Result<()> {
    let resolver = SlotResolver::new(hours, settings.timezone, settings.slot_minutes);
    let range = match resolver.resolve_input(Utc::now(), input) {
        Ok(range) => range,
        Err(err) => {
            println!("rejected: {}", err);
            return Ok(());
        }
    };
    match AvailabilityChecker::new(calendar).check_free(&range).await {
        Ok(true) => println!("free: {}", range),
        Ok(false) => println!("busy: {}", range),
        Err(err) => println!("not free ({}): {}", err, range),
    }
    Ok(())
}
