//! Query facade over the load monitor and event journal
//!
//! This crate defines the public tracking contract, [`ImageTracking`],
//! and its implementation [`TrackerCore`]. Consumers go through this
//! layer only; the monitor and journal are wired together here.

mod tracking;

pub use tracking::{ImageTracking, LoadedImage, TrackerCore, TrackerMetrics};
