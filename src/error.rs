use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("could not parse input: {0}")]
    Parse(String),

    #[error("invalid day: {0}")]
    InvalidDay(String),

    #[error("invalid time format: {0}")]
    Format(String),

    #[error("{time} on {day} is outside office hours")]
    OutsideOfficeHours { day: String, time: String },

    #[error("the slot starting at {start} is already booked")]
    SlotTaken { start: String },

    #[error("calendar backend error: {0}")]
    Backend(String),

    #[error("event not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SchedulerError {
    /// Errors the dialogue recovers from by asking again in the same state.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound(_) | Self::Config(_))
    }
}

impl From<reqwest::Error> for SchedulerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SchedulerError::Backend(format!("request timed out: {err}"))
        } else {
            SchedulerError::Backend(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
