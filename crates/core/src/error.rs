//! Error types for load tracking.
//!
//! This module defines the canonical error taxonomy. Failures inside the
//! linker's notification callback are never surfaced as errors (they are
//! converted to counters and sentinel records); these variants are what
//! the public operations return to callers.

use thiserror::Error;

/// All tracking errors.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The environment refused to install the notification observer.
    ///
    /// Fatal to tracking: no events will be recorded. Returned from
    /// activation, never panicked.
    #[error("registration failed: {reason}")]
    RegistrationFailed {
        /// Why the environment refused
        reason: String,
    },

    /// A store could not accommodate a new entry.
    ///
    /// Non-fatal: the entry is dropped and a drop counter is incremented.
    /// This is the only data-loss path.
    #[error("resource exhausted: {what} limit of {limit} reached")]
    ResourceExhausted {
        /// Which store hit its limit
        what: &'static str,
        /// The configured limit
        limit: usize,
    },

    /// The environment supplied an unusable image descriptor.
    ///
    /// Non-fatal: the event is recorded with sentinel values, never
    /// dropped silently. Surfaces here only in diagnostics.
    #[error("malformed notification: {detail}")]
    MalformedNotification {
        /// What was unusable about the descriptor
        detail: String,
    },
}

/// Result type for tracking operations.
pub type TrackResult<T> = Result<T, TrackError>;

impl TrackError {
    /// Check if this error ends tracking for the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TrackError::RegistrationFailed { .. })
    }

    /// Check if this error represents a dropped event.
    pub fn is_data_loss(&self) -> bool {
        matches!(self, TrackError::ResourceExhausted { .. })
    }
}
