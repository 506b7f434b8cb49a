//! In-memory linker environment for tests.

use crate::env::{EnvError, ImageObserver, LinkerEnv, RawImageNotice};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// A linker environment driven entirely by the test.
///
/// No real images are loaded: registration is counted, preloaded images
/// are replayed on registration just as the platform backends replay
/// already-mapped images, and [`load`](SimulatedLinker::load)/
/// [`unload`](SimulatedLinker::unload) deliver notices synchronously on
/// the calling thread. This gives tests maximum isolation and lets them
/// drive notices from as many threads as they like.
pub struct SimulatedLinker {
    observer: Mutex<Option<ImageObserver>>,
    preloaded: Mutex<Vec<(PathBuf, u64)>>,
    registrations: AtomicUsize,
    refuse: AtomicBool,
}

impl SimulatedLinker {
    /// A simulated environment with no preloaded images.
    pub fn new() -> Arc<Self> {
        Arc::new(SimulatedLinker {
            observer: Mutex::new(None),
            preloaded: Mutex::new(Vec::new()),
            registrations: AtomicUsize::new(0),
            refuse: AtomicBool::new(false),
        })
    }

    /// A simulated environment that already has images mapped; they are
    /// replayed as `Loaded` notices during registration.
    pub fn with_preloaded<I, P>(images: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (P, u64)>,
        P: Into<PathBuf>,
    {
        let env = Self::new();
        *env.preloaded.lock() = images
            .into_iter()
            .map(|(path, addr)| (path.into(), addr))
            .collect();
        env
    }

    /// How many times `register` has been called, refused or not.
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Whether an observer is currently installed.
    pub fn is_registered(&self) -> bool {
        self.observer.lock().is_some()
    }

    /// Make subsequent `register` calls fail.
    pub fn refuse_registration(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    /// Allow `register` calls again.
    pub fn allow_registration(&self) {
        self.refuse.store(false, Ordering::SeqCst);
    }

    /// Deliver a load notice for `path`.
    pub fn load(&self, path: impl Into<PathBuf>, load_address: u64) {
        self.emit(RawImageNotice {
            path: Some(path.into()),
            load_address,
            added: true,
        });
    }

    /// Deliver an unload notice for `path`.
    pub fn unload(&self, path: impl Into<PathBuf>, load_address: u64) {
        self.emit(RawImageNotice {
            path: Some(path.into()),
            load_address,
            added: false,
        });
    }

    /// Deliver a notice whose path the linker could not resolve.
    pub fn emit_malformed(&self, load_address: u64) {
        self.emit(RawImageNotice {
            path: None,
            load_address,
            added: true,
        });
    }

    /// Deliver an arbitrary raw notice to the installed observer.
    ///
    /// Silently ignored when nothing is registered, matching a real
    /// linker notifying after deregistration.
    pub fn emit(&self, notice: RawImageNotice) {
        let observer = self.observer.lock().clone();
        if let Some(observer) = observer {
            observer(notice);
        }
    }
}

impl LinkerEnv for SimulatedLinker {
    fn register(&self, observer: ImageObserver) -> Result<(), EnvError> {
        self.registrations.fetch_add(1, Ordering::SeqCst);

        if self.refuse.load(Ordering::SeqCst) {
            return Err(EnvError::RegistrationRefused(
                "simulated refusal".to_string(),
            ));
        }

        {
            let mut slot = self.observer.lock();
            if slot.is_some() {
                return Err(EnvError::RegistrationRefused(
                    "an observer is already installed in this process".to_string(),
                ));
            }
            *slot = Some(observer.clone());
        }

        // Replay images mapped before registration, as the platform does.
        for (path, load_address) in self.preloaded.lock().iter() {
            observer(RawImageNotice {
                path: Some(path.clone()),
                load_address: *load_address,
                added: true,
            });
        }

        Ok(())
    }

    fn unregister(&self) {
        self.observer.lock().take();
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
