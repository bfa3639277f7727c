//! Error types for the navigation engine.
//!
//! Every I/O failure is contained at the component that produced it; these
//! types exist so the orchestrator can log them and count failed ticks.

use crate::store::StoreError;

/// Result type for engine operations
pub type NavigationResult<T> = Result<T, NavigationError>;

/// Device location failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Permission to access location was denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Route service failures.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The request never produced a response (connection, timeout, ...).
    #[error("Route service transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("Route service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is missing a field or holds an unusable value.
    #[error("Malformed route response ({field}): {message}")]
    MalformedResponse { field: String, message: String },
}

impl RouteError {
    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        RouteError::MalformedResponse {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Problems with the stored schedule contents.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleDataError {
    #[error("Class {course_number} has an unparsable start time '{value}'")]
    InvalidStartTime { course_number: String, value: String },
}

/// Top-level engine error.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    ScheduleData(#[from] ScheduleDataError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: &'static str },
}
