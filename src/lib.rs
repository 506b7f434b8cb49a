//! # Loadtrail
//!
//! In-process tracking of dynamic-image loads and unloads.
//!
//! Loadtrail observes every shared library the dynamic linker maps into
//! or removes from the current process, records each occurrence in an
//! append-only journal, and exposes the history through snapshot reads
//! and live subscriptions.
//!
//! ## Quick Start
//!
//! ```ignore
//! use loadtrail::prelude::*;
//!
//! // Build a tracker on the platform linker and begin observing.
//! let tracker = Tracker::system();
//! tracker.activate()?;
//!
//! // What is mapped right now?
//! for image in tracker.currently_loaded() {
//!     println!("{} @ {:#x}", image.path, image.load_address);
//! }
//!
//! // Full ordered history, and a cursor for incremental polling.
//! let history = tracker.history();
//! let newer = tracker.events_since(41);
//!
//! // Live delivery of future events.
//! let updates = tracker.live_updates()?;
//! for event in updates.take(3) {
//!     println!("{event}");
//! }
//! ```
//!
//! ## Guarantees
//!
//! - Sequence numbers are strictly increasing and gap-free per process
//!   run; snapshots are point-in-time consistent.
//! - Nothing ever propagates back into the linker's notification
//!   context; internal failures become counters and sentinel records.
//! - Unload observation is best-effort: dyld reports image removal,
//!   `dl_iterate_phdr` platforms do not.
//!
//! ## Testing
//!
//! [`Tracker::simulated`] builds a tracker on an in-memory linker
//! environment that tests drive explicitly - no real images involved.

#![warn(missing_docs)]

mod error;
mod tracker;

pub mod prelude;

// Re-export main entry points
pub use error::{Error, Result};
pub use tracker::{Tracker, TrackerBuilder};

// Re-export the public contract and its types
pub use loadtrail_api::{ImageTracking, LoadedImage, TrackerMetrics};
pub use loadtrail_core::{EventKind, ImageEvent, ImagePath, UNKNOWN_IMAGE};
pub use loadtrail_journal::Subscription;

// Re-export the environment seam for custom and test backends
pub use loadtrail_monitor::{
    system_linker, EnvError, ImageObserver, LinkerEnv, RawImageNotice, SimulatedLinker,
};
