//! Comprehensive public-API tests for the tracker.
//!
//! Organized by area:
//! - `journal`: ordering, snapshots, cursors, subscriptions, concurrency
//! - `monitor`: registration, lifecycle, malformed notices
//! - `facade`: loaded-image replay, end-to-end scenarios, metrics
//!
//! Everything runs against the simulated linker environment; no real
//! images are loaded anywhere in this suite.

mod facade;
mod journal;
mod monitor;

pub use loadtrail::prelude::*;
pub use std::sync::Arc;

/// A tracker on a fresh simulated environment, already activated.
pub fn quick_setup() -> (Tracker, Arc<SimulatedLinker>) {
    init_tracing();
    let (tracker, linker) = Tracker::simulated();
    tracker.activate().expect("activation should succeed");
    (tracker, linker)
}

/// Install the test tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Shorthand for a library path under `/usr/lib`.
pub fn lib(name: &str) -> String {
    format!("/usr/lib/{name}")
}
