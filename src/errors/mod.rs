/// Unified error handling module
use std::time::Duration;
use thiserror::Error;

/// Failures while turning a fetched payload into domain values
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("trip has no stops")]
    NoStops,
    #[error("stop #{0} has no station")]
    MissingStation(usize),
    #[error("stop #{index} ({station}) lies before the stop preceding it")]
    UnorderedStops { index: usize, station: String },
    #[error("invalid value {value:?} in field {field}")]
    InvalidField { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("update did not finish within {0:?}")]
    Timeout(Duration),
    #[error("train arrived in {0}")]
    TripComplete(String),
    #[error("stop {name:?} not found. Valid stops are: {}", .valid.join(", "))]
    DestinationNotFound { name: String, valid: Vec<String> },
    #[error("train has passed {0}")]
    DestinationPassed(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    /// Whether polling should stop after this error
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppError::TripComplete(_))
    }
}

/// Type alias for application results
pub type AppResult<T> = Result<T, AppError>;
