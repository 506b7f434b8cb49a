//! Main entry point for Loadtrail.
//!
//! This module provides the `Tracker` struct, the primary handle for
//! consumers, and its builder.

use crate::error::Result;
use loadtrail_api::{ImageTracking, LoadedImage, TrackerCore, TrackerMetrics};
use loadtrail_core::ImageEvent;
use loadtrail_journal::{EventJournal, Subscription};
use loadtrail_monitor::{system_linker, LinkerEnv, SimulatedLinker};
use std::sync::Arc;

/// Default cap on concurrent live subscriptions.
const DEFAULT_MAX_SUBSCRIBERS: usize = 1024;

/// A dynamic-image load tracker.
///
/// One tracker owns one observation channel into the dynamic linker,
/// with an explicit lifecycle: build, [`activate`](Tracker::activate),
/// query, optionally [`deactivate`](Tracker::deactivate). Create one
/// with [`Tracker::system`], [`Tracker::simulated`], or
/// [`Tracker::builder`].
///
/// # Example
///
/// ```ignore
/// use loadtrail::prelude::*;
///
/// let tracker = Tracker::system();
/// tracker.activate()?;
///
/// let images = tracker.currently_loaded();
/// let history = tracker.history();
/// ```
pub struct Tracker {
    inner: TrackerCore,
}

impl Tracker {
    /// A tracker on the platform's linker notification backend, with
    /// default settings.
    pub fn system() -> Self {
        Self::builder().build()
    }

    /// A tracker on an in-memory simulated linker.
    ///
    /// Nothing real is observed: the returned [`SimulatedLinker`] handle
    /// drives image loads, unloads, and malformed notices explicitly.
    /// Intended for unit tests needing maximum isolation and speed.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let (tracker, linker) = Tracker::simulated();
    /// tracker.activate()?;
    ///
    /// linker.load("/usr/lib/liba.so", 0x1000);
    /// assert_eq!(tracker.history().len(), 1);
    /// ```
    pub fn simulated() -> (Self, Arc<SimulatedLinker>) {
        let env = SimulatedLinker::new();
        let tracker = Self::builder().env(env.clone()).build();
        (tracker, env)
    }

    /// Create a builder for tracker configuration.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let tracker = Tracker::builder()
    ///     .max_events(100_000)
    ///     .build();
    /// ```
    pub fn builder() -> TrackerBuilder {
        TrackerBuilder::new()
    }

    /// Begin tracking.
    ///
    /// Idempotent: any number of consumers may call this; exactly one
    /// observer is registered with the environment. Images already
    /// mapped at activation are replayed, so the history is complete
    /// from process start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistrationFailed`](crate::Error) when the
    /// environment refuses the observer (for example, another tracker in
    /// this process already holds the channel, or the platform has no
    /// notification interface).
    pub fn activate(&self) -> Result<()> {
        Ok(self.inner.activate()?)
    }

    /// Stop tracking; later loads and unloads are not recorded.
    ///
    /// Optional: the typical consumer activates once at process start
    /// and never deactivates.
    pub fn deactivate(&self) {
        self.inner.deactivate();
    }

    /// The set of images currently mapped into the process, derived by
    /// replaying the recorded history.
    pub fn currently_loaded(&self) -> Vec<LoadedImage> {
        self.inner.currently_loaded()
    }

    /// The full ordered event history, consistent at the instant of the
    /// call.
    pub fn history(&self) -> Vec<ImageEvent> {
        self.inner.history()
    }

    /// Events with sequence strictly greater than `cursor`.
    pub fn events_since(&self, cursor: u64) -> Vec<ImageEvent> {
        self.inner.events_since(cursor)
    }

    /// Subscribe to events recorded after this call.
    ///
    /// The subscription yields events in ascending sequence order; drop
    /// it to cancel. Combine with [`history`](Tracker::history) for a
    /// consistent historical-plus-live view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`](crate::Error) when the
    /// configured subscriber limit is reached.
    pub fn live_updates(&self) -> Result<Subscription> {
        Ok(self.inner.live_updates()?)
    }

    /// Get tracking counters.
    pub fn metrics(&self) -> TrackerMetrics {
        self.inner.metrics()
    }
}

/// Builder for tracker configuration.
///
/// # Example
///
/// ```ignore
/// // Production: platform backend, bounded journal.
/// let tracker = Tracker::builder()
///     .max_events(1_000_000)
///     .build();
///
/// // Testing: simulated backend.
/// let (tracker, linker) = Tracker::simulated();
/// ```
pub struct TrackerBuilder {
    env: Option<Arc<dyn LinkerEnv>>,
    max_events: Option<usize>,
    max_subscribers: usize,
}

impl TrackerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        TrackerBuilder {
            env: None,
            max_events: None,
            max_subscribers: DEFAULT_MAX_SUBSCRIBERS,
        }
    }

    /// Use a specific linker environment instead of the platform one.
    pub fn env(mut self, env: Arc<dyn LinkerEnv>) -> Self {
        self.env = Some(env);
        self
    }

    /// Bound the journal to `limit` records.
    ///
    /// Once full, further events are dropped and counted; the journal is
    /// unbounded by default.
    pub fn max_events(mut self, limit: usize) -> Self {
        self.max_events = Some(limit);
        self
    }

    /// Bound the number of concurrent live subscriptions.
    pub fn max_subscribers(mut self, limit: usize) -> Self {
        self.max_subscribers = limit;
        self
    }

    /// Build the tracker. Tracking does not begin until
    /// [`Tracker::activate`].
    pub fn build(self) -> Tracker {
        let env = self.env.unwrap_or_else(system_linker);
        let journal = Arc::new(match self.max_events {
            Some(limit) => EventJournal::with_capacity(limit),
            None => EventJournal::new(),
        });
        Tracker {
            inner: TrackerCore::new(env, journal, self.max_subscribers),
        }
    }
}

impl Default for TrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
