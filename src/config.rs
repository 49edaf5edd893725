use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::clients::google_calendar::GOOGLE_API_BASE;
use crate::clients::openai_client::OPENAI_BASE_URL;
use crate::error::{Result, SchedulerError};
use crate::models::slot::DEFAULT_SLOT_MINUTES;

const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OFFICE_HOURS_DOC: &str = "office_hours";

/// `KEY=VALUE` pairs from an optional config file.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SchedulerError::Config(format!("cannot read {}: {}", path, e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(SchedulerError::Config(format!(
                    "Invalid config line {}: {}",
                    idx + 1,
                    line
                )));
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    /// File value first, then the process environment.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.get(key)
            .or_else(|| env::var(key).ok())
            .filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarBackend {
    Google,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub timezone: Tz,
    pub slot_minutes: u32,
    pub max_attempts: u32,
    pub http_timeout: Duration,
    pub calendar_backend: CalendarBackend,
    pub google_access_token: Option<String>,
    pub google_calendar_id: String,
    pub google_api_base: String,
    pub office_hours_file: Option<PathBuf>,
    pub office_hours_doc: String,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::from_lookup(|key| config.lookup(key))
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timezone_name = get("TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = timezone_name.parse().map_err(|_| {
            SchedulerError::Config(format!("unknown timezone '{}'", timezone_name))
        })?;

        let calendar_backend = match get("CALENDAR_BACKEND").as_deref() {
            None | Some("google") => CalendarBackend::Google,
            Some("memory") => CalendarBackend::Memory,
            Some(other) => {
                return Err(SchedulerError::Config(format!(
                    "CALENDAR_BACKEND must be 'google' or 'memory', got '{}'",
                    other
                )));
            }
        };

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            timezone,
            slot_minutes: positive(&get, "SLOT_MINUTES", DEFAULT_SLOT_MINUTES)?,
            max_attempts: positive(&get, "MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            http_timeout: Duration::from_secs(positive(
                &get,
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            calendar_backend,
            google_access_token: get("GOOGLE_ACCESS_TOKEN"),
            google_calendar_id: get("GOOGLE_CALENDAR_ID").unwrap_or_else(|| "primary".to_string()),
            google_api_base: get("GOOGLE_API_BASE").unwrap_or_else(|| GOOGLE_API_BASE.to_string()),
            office_hours_file: get("OFFICE_HOURS_FILE").map(PathBuf::from),
            office_hours_doc: get("OFFICE_HOURS_DOC")
                .unwrap_or_else(|| DEFAULT_OFFICE_HOURS_DOC.to_string()),
        })
    }

    pub fn require_openai_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| SchedulerError::Config("OPENAI_API_KEY must be set".to_string()))
    }

    pub fn require_google_token(&self) -> Result<&str> {
        self.google_access_token
            .as_deref()
            .ok_or_else(|| SchedulerError::Config("GOOGLE_ACCESS_TOKEN must be set".to_string()))
    }
}

fn positive<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(SchedulerError::Config(format!(
            "{} must be a positive integer, got '{}'",
            key, raw
        ))),
    }
}
