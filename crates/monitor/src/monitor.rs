//! The load monitor: raw linker notices in, journal records out.

use crate::env::{ImageObserver, LinkerEnv, RawImageNotice};
use loadtrail_core::{EventKind, ImagePath, TrackResult};
use loadtrail_journal::EventJournal;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Bridges the linker environment's notifications into the journal.
///
/// One monitor owns one observation channel, with an explicit
/// [`start`](LoadMonitor::start)/[`stop`](LoadMonitor::stop) lifecycle;
/// there is no ambient global state at this layer. The notice handler
/// runs on whatever thread the environment chooses and does nothing but
/// normalize and append: no blocking, no re-entry into the linker, no
/// unwinding.
pub struct LoadMonitor {
    env: Arc<dyn LinkerEnv>,
    journal: Arc<EventJournal>,

    /// Whether an observer is currently registered.
    started: AtomicBool,

    /// Notices that arrived without a usable path.
    ///
    /// Such events are recorded with the unknown-path sentinel rather
    /// than dropped; this counter makes them visible to consumers.
    malformed: AtomicU64,
}

impl LoadMonitor {
    /// Create a monitor feeding `journal` from `env`. Tracking does not
    /// begin until [`start`](LoadMonitor::start).
    pub fn new(env: Arc<dyn LinkerEnv>, journal: Arc<EventJournal>) -> Arc<Self> {
        Arc::new(LoadMonitor {
            env,
            journal,
            started: AtomicBool::new(false),
            malformed: AtomicU64::new(0),
        })
    }

    /// Register the notification observer.
    ///
    /// Idempotent: a second call while started is a no-op and does not
    /// double-register. The environment replays already-loaded images
    /// during registration, so no event is missed regardless of when in
    /// the process lifetime this runs.
    ///
    /// # Errors
    ///
    /// - `RegistrationFailed`: the environment refused the observer.
    ///   The monitor remains stopped and may be started again later.
    pub fn start(self: &Arc<Self>) -> TrackResult<()> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }

        let monitor = Arc::clone(self);
        let observer: ImageObserver = Arc::new(move |notice| monitor.on_notice(notice));

        match self.env.register(observer) {
            Ok(()) => {
                info!(env = self.env.name(), "load monitor started");
                Ok(())
            }
            Err(err) => {
                self.started.store(false, Ordering::SeqCst);
                warn!(env = self.env.name(), error = %err, "load monitor failed to start");
                Err(err.into())
            }
        }
    }

    /// Deregister the observer; later loads and unloads are not recorded.
    ///
    /// Optional: long-running consumers typically start once and never
    /// stop. Safe to call when already stopped.
    pub fn stop(&self) {
        if self
            .started
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.env.unregister();
            info!(env = self.env.name(), "load monitor stopped");
        }
    }

    /// Whether the observer is currently registered.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Count of notices that arrived without a usable path.
    pub fn malformed_notices(&self) -> u64 {
        self.malformed.load(Ordering::SeqCst)
    }

    /// Normalize one raw notice and append it.
    ///
    /// Runs inside the environment's notification context: every failure
    /// is converted to a counter or a sentinel record here, nothing
    /// propagates back to the linker.
    fn on_notice(&self, notice: RawImageNotice) {
        let kind = if notice.added {
            EventKind::Loaded
        } else {
            EventKind::Unloaded
        };

        let path = match notice.path {
            Some(p) if !p.as_os_str().is_empty() => ImagePath::Known(p),
            _ => {
                self.malformed.fetch_add(1, Ordering::SeqCst);
                warn!(
                    load_address = notice.load_address,
                    "image notice without usable path, recording sentinel"
                );
                ImagePath::Unknown
            }
        };

        if let Err(err) = self.journal.append(kind, path, notice.load_address) {
            // Capacity refusal; the journal has already counted the drop.
            warn!(error = %err, "image event not recorded");
        }
    }
}
