//! Core types for dynamic-image load tracking
//!
//! This crate defines the canonical data structures shared by every layer
//! of the system:
//! - [`ImageEvent`]: one immutable load or unload observation
//! - [`EventKind`]: load vs. unload
//! - [`ImagePath`]: the image's file-system identity, with an explicit
//!   sentinel for paths the linker could not supply
//! - [`TrackError`]: the error taxonomy for tracking operations
//!
//! All other crates in the workspace share these definitions; none of the
//! types here hold locks or talk to the platform.

pub mod error;
pub mod event;

pub use error::{TrackError, TrackResult};
pub use event::{now_millis, EventKind, ImageEvent, ImagePath, UNKNOWN_IMAGE};
