//! The tracking contract and its implementation.

use loadtrail_core::{EventKind, ImageEvent, ImagePath, TrackError, TrackResult};
use loadtrail_journal::{EventJournal, Subscription};
use loadtrail_monitor::{LinkerEnv, LoadMonitor};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One image currently mapped into the process.
///
/// Derived from the journal, not separately tracked: an image is loaded
/// when its `Loaded` count exceeds its `Unloaded` count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// Image identity.
    pub path: ImagePath,
    /// Base address from the most recent load.
    pub load_address: u64,
    /// Sequence number of the most recent `Loaded` event.
    pub loaded_at: u64,
}

/// Tracking counters.
///
/// `events_dropped` is the only data-loss signal in the system;
/// `malformed_notices` counts events recorded with sentinel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerMetrics {
    /// Records currently in the journal
    pub events_recorded: u64,
    /// Events refused because the journal was full
    pub events_dropped: u64,
    /// Notices that arrived without a usable path
    pub malformed_notices: u64,
    /// Live subscriptions
    pub active_subscribers: usize,
}

/// Image tracking operations
///
/// This trait is the only entry point consumers use. All reads are
/// served from the journal's recorded history, so every view is
/// consistent with every other.
///
/// ## Error Handling
///
/// | Condition | Error |
/// |-----------|-------|
/// | Environment refuses the observer | `RegistrationFailed` |
/// | Subscriber limit reached | `ResourceExhausted` |
pub trait ImageTracking {
    /// Begin tracking.
    ///
    /// Starts the monitor exactly once; repeat calls from any number of
    /// consumers are no-ops. Images already mapped at activation are
    /// replayed by the environment, so the history is complete from
    /// process start.
    fn activate(&self) -> TrackResult<()>;

    /// Stop tracking. Optional; most consumers activate once and never
    /// deactivate.
    fn deactivate(&self);

    /// The set of images currently mapped into the process.
    ///
    /// Computed by replaying the full recorded history, which keeps the
    /// answer consistent with [`history`](ImageTracking::history) by
    /// construction. Results are in load order (ascending
    /// `loaded_at`).
    fn currently_loaded(&self) -> Vec<LoadedImage>;

    /// The full ordered event history.
    fn history(&self) -> Vec<ImageEvent>;

    /// Events with sequence strictly greater than `cursor`, for
    /// incremental polling.
    fn events_since(&self, cursor: u64) -> Vec<ImageEvent>;

    /// Subscribe to events recorded after this call.
    ///
    /// ## Errors
    ///
    /// - `ResourceExhausted`: the configured subscriber limit is reached
    fn live_updates(&self) -> TrackResult<Subscription>;

    /// Current tracking counters.
    fn metrics(&self) -> TrackerMetrics;
}

/// Facade implementation over a monitor + journal pair.
pub struct TrackerCore {
    monitor: Arc<LoadMonitor>,
    journal: Arc<EventJournal>,
    max_subscribers: usize,
}

impl TrackerCore {
    /// Wire a monitor to `journal` over `env`.
    pub fn new(
        env: Arc<dyn LinkerEnv>,
        journal: Arc<EventJournal>,
        max_subscribers: usize,
    ) -> Self {
        let monitor = LoadMonitor::new(env, journal.clone());
        TrackerCore {
            monitor,
            journal,
            max_subscribers,
        }
    }

    /// The underlying journal, for callers composing snapshot + live
    /// reads themselves.
    pub fn journal(&self) -> &Arc<EventJournal> {
        &self.journal
    }
}

impl ImageTracking for TrackerCore {
    fn activate(&self) -> TrackResult<()> {
        self.monitor.start()
    }

    fn deactivate(&self) {
        self.monitor.stop();
    }

    fn currently_loaded(&self) -> Vec<LoadedImage> {
        struct Tally {
            balance: i64,
            latest: Option<(u64, u64)>, // (load_address, sequence)
        }

        let history = self.journal.snapshot();
        let mut tallies: HashMap<ImagePath, Tally> = HashMap::new();

        for event in &history {
            let tally = tallies.entry(event.path.clone()).or_insert(Tally {
                balance: 0,
                latest: None,
            });
            match event.kind {
                EventKind::Loaded => {
                    tally.balance += 1;
                    tally.latest = Some((event.load_address, event.sequence));
                }
                EventKind::Unloaded => tally.balance -= 1,
            }
        }

        let mut loaded: Vec<LoadedImage> = tallies
            .into_iter()
            .filter(|(_, tally)| tally.balance > 0)
            .filter_map(|(path, tally)| {
                tally.latest.map(|(load_address, loaded_at)| LoadedImage {
                    path,
                    load_address,
                    loaded_at,
                })
            })
            .collect();
        loaded.sort_by_key(|image| image.loaded_at);

        debug!(
            images = loaded.len(),
            events = history.len(),
            "replayed journal for loaded-image set"
        );
        loaded
    }

    fn history(&self) -> Vec<ImageEvent> {
        self.journal.snapshot()
    }

    fn events_since(&self, cursor: u64) -> Vec<ImageEvent> {
        self.journal.since(cursor)
    }

    fn live_updates(&self) -> TrackResult<Subscription> {
        if self.journal.subscriber_count() >= self.max_subscribers {
            return Err(TrackError::ResourceExhausted {
                what: "subscribers",
                limit: self.max_subscribers,
            });
        }
        Ok(self.journal.subscribe())
    }

    fn metrics(&self) -> TrackerMetrics {
        TrackerMetrics {
            events_recorded: self.journal.len() as u64,
            events_dropped: self.journal.dropped(),
            malformed_notices: self.monitor.malformed_notices(),
            active_subscribers: self.journal.subscriber_count(),
        }
    }
}
