//! Error types for meeting-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Invalid recurrence pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Expansion error: {0}")]
    Expansion(String),
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
