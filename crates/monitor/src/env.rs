//! The seam between the tracker and the operating environment.

use loadtrail_core::TrackError;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// A raw image notification as handed over by the dynamic linker.
///
/// This is the unvalidated form: the path may be missing (the linker
/// could not resolve one) and nothing is normalized yet.
#[derive(Debug, Clone)]
pub struct RawImageNotice {
    /// Absolute path of the image, if the linker supplied one.
    pub path: Option<PathBuf>,
    /// Base address the image is mapped at.
    pub load_address: u64,
    /// `true` for a load, `false` for an unload.
    pub added: bool,
}

/// Observer installed into a linker environment.
///
/// Invoked by the environment on an arbitrary thread, potentially while
/// the linker holds internal locks: implementations must return quickly,
/// must not block, and must not unwind.
pub type ImageObserver = Arc<dyn Fn(RawImageNotice) + Send + Sync>;

/// Errors from the linker environment boundary.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The environment refused to install the observer.
    #[error("linker observer registration refused: {0}")]
    RegistrationRefused(String),
}

impl From<EnvError> for TrackError {
    fn from(err: EnvError) -> Self {
        match err {
            EnvError::RegistrationRefused(reason) => TrackError::RegistrationFailed { reason },
        }
    }
}

/// A dynamic-linker notification mechanism.
///
/// Implementations wrap whatever the platform offers. The contract:
///
/// - `register` installs at most one observer and, before returning,
///   delivers a `Loaded` notice for every image already mapped into the
///   process, then keeps delivering for future loads and unloads (where
///   the platform reports them).
/// - A second `register` while an observer is installed is refused; the
///   process has a single observation channel.
/// - `unregister` stops delivery. Implementations for platforms with no
///   deregistration API drop notices instead.
pub trait LinkerEnv: Send + Sync {
    /// Install `observer` and replay already-loaded images into it.
    fn register(&self, observer: ImageObserver) -> Result<(), EnvError>;

    /// Stop delivering notices.
    fn unregister(&self);

    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Backend for platforms without a linker notification interface.
///
/// Registration is always refused, so activation surfaces a
/// `RegistrationFailed` error instead of silently recording nothing.
pub struct UnsupportedLinker;

impl LinkerEnv for UnsupportedLinker {
    fn register(&self, _observer: ImageObserver) -> Result<(), EnvError> {
        Err(EnvError::RegistrationRefused(
            "no linker notification backend for this platform".to_string(),
        ))
    }

    fn unregister(&self) {}

    fn name(&self) -> &'static str {
        "unsupported"
    }
}
