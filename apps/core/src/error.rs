use std::io;
use thiserror::Error;

use crate::models::Status;

/// Engine-wide error type, consolidating every failure the intake path can observe.
///
/// Only `Validation`, `Config`, `NoEligibleHandler` and `InvalidTransition` ever reach a
/// caller of the pipeline. Capability failures are recovered locally and logged.
#[derive(Debug, Error)]
pub enum DeskError {
    /// The category classification capability could not produce an answer.
    #[error("Classification unavailable: {0}")]
    ClassificationUnavailable(String),

    /// The resolution assistant failed (transport error, bad payload, etc.).
    #[error("Resolution capability error: {0}")]
    ResolutionCapability(String),

    /// Represents errors from operations that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// No handler could be selected, not even through the least-loaded fallback.
    #[error("No eligible handler for category {category}")]
    NoEligibleHandler { category: String },

    /// A ticket was asked to move along an edge the state machine does not have.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },

    /// Represents data validation errors (e.g., a title that is too short).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., unreadable config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents unexpected internal errors, such as a closed actor channel.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, DeskError>;

impl DeskError {
    /// Whether the pipeline recovers from this error instead of surfacing it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DeskError::ClassificationUnavailable(_)
                | DeskError::ResolutionCapability(_)
                | DeskError::Timeout(_)
        )
    }
}

impl From<tokio::time::error::Elapsed> for DeskError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        DeskError::Timeout(err.to_string())
    }
}

impl From<serde_json::Error> for DeskError {
    fn from(err: serde_json::Error) -> Self {
        DeskError::Config(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for DeskError {
    fn from(err: validator::ValidationErrors) -> Self {
        DeskError::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for DeskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeskError::Timeout(format!("HTTP request timed out: {}", err))
        } else {
            DeskError::ResolutionCapability(format!("HTTP error: {}", err))
        }
    }
}
