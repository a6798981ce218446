// Error types for the game clock and schedule.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    /// A timestamp was missing, malformed, or outside the range the clock can
    /// represent. Never recovered by substituting the current time.
    #[error("invalid timestamp input: {message}")]
    InvalidInput { message: String },

    /// The weekly timetable does not partition the week.
    #[error("invalid schedule field `{field}`: {message}")]
    InvalidSchedule { field: String, message: String },
}

impl ClockError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        ClockError::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_schedule(field: impl Into<String>, message: impl Into<String>) -> Self {
        ClockError::InvalidSchedule {
            field: field.into(),
            message: message.into(),
        }
    }
}
