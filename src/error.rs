//! Unified error types for Loadtrail.
//!
//! This module wraps the internal error taxonomy in a single stable type
//! for consumers of the crate root.

use loadtrail_core::TrackError;
use thiserror::Error;

/// All Loadtrail errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The environment refused the notification observer; tracking did
    /// not begin. The process keeps running.
    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    /// A store hit its configured limit; the operation was refused and,
    /// for event appends, the drop counter incremented.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The environment supplied an unusable image descriptor.
    #[error("malformed notification: {0}")]
    MalformedNotification(String),
}

/// Result type for Loadtrail operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error ends tracking for the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::RegistrationFailed(_))
    }
}

impl From<TrackError> for Error {
    fn from(err: TrackError) -> Self {
        match err {
            TrackError::RegistrationFailed { reason } => Error::RegistrationFailed(reason),
            TrackError::ResourceExhausted { what, limit } => {
                Error::ResourceExhausted(format!("{} limit of {} reached", what, limit))
            }
            TrackError::MalformedNotification { detail } => Error::MalformedNotification(detail),
        }
    }
}
