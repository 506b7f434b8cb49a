//! Convenient imports for Loadtrail.
//!
//! This module re-exports the most commonly used types so you can get
//! started with a single import:
//!
//! ```ignore
//! use loadtrail::prelude::*;
//!
//! let tracker = Tracker::system();
//! tracker.activate()?;
//! ```

// Main entry point
pub use crate::tracker::{Tracker, TrackerBuilder};

// Error handling
pub use crate::error::{Error, Result};

// The tracking contract
pub use loadtrail_api::{ImageTracking, LoadedImage, TrackerMetrics};

// Event types
pub use loadtrail_core::{EventKind, ImageEvent, ImagePath};

// Live delivery
pub use loadtrail_journal::Subscription;

// Environment seam (custom and test backends)
pub use loadtrail_monitor::{LinkerEnv, SimulatedLinker};
