//! Bridging the platform dynamic linker into the event journal
//!
//! This crate owns everything that touches the operating environment:
//! - [`LinkerEnv`]: the seam over the linker's notification mechanism,
//!   injectable so tests never need the real platform
//! - Platform backends: dyld on macOS/iOS, `dl_iterate_phdr` on
//!   Linux/Android, and [`SimulatedLinker`] for tests
//! - [`LoadMonitor`]: receives raw notices, normalizes them into records,
//!   and appends them to the journal
//!
//! The crate is purely observational: it never loads or unloads
//! libraries itself.

mod env;
mod monitor;
mod simulated;

#[cfg(any(target_os = "macos", target_os = "ios"))]
mod dyld;
#[cfg(any(target_os = "linux", target_os = "android"))]
mod phdr;

pub use env::{EnvError, ImageObserver, LinkerEnv, RawImageNotice, UnsupportedLinker};
pub use monitor::LoadMonitor;
pub use simulated::SimulatedLinker;

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub use dyld::DyldLinker;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use phdr::PhdrLinker;

use std::sync::Arc;

/// The platform's linker notification backend.
///
/// On unsupported platforms this returns a stub whose registration is
/// refused, so activation reports `RegistrationFailed` instead of the
/// crate failing to build.
pub fn system_linker() -> Arc<dyn LinkerEnv> {
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    {
        Arc::new(DyldLinker::new())
    }
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        Arc::new(PhdrLinker::new())
    }
    #[cfg(not(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "linux",
        target_os = "android"
    )))]
    {
        Arc::new(UnsupportedLinker)
    }
}
