//! `dl_iterate_phdr`-backed linker environment for Linux and Android.
//!
//! glibc exposes no public load/unload notification hook, so this
//! backend can only satisfy the retroactive half of the contract: every
//! image mapped at registration time is reported as `Loaded`. Ongoing
//! loads and unloads are not observed, and no `Unloaded` record is ever
//! produced here.

use crate::env::{EnvError, ImageObserver, LinkerEnv, RawImageNotice};
use parking_lot::Mutex;
use std::ffi::CStr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

/// The `dl_iterate_phdr` enumeration backend.
///
/// Unlike dyld there is no process-global callback table to share, so
/// the observer is held per instance; the single-channel rule is still
/// enforced per environment.
pub struct PhdrLinker {
    observer: Mutex<Option<ImageObserver>>,
}

impl PhdrLinker {
    /// Handle to the program-header enumeration interface.
    pub fn new() -> Self {
        PhdrLinker {
            observer: Mutex::new(None),
        }
    }
}

impl Default for PhdrLinker {
    fn default() -> Self {
        Self::new()
    }
}

unsafe extern "C" fn visit_phdr(
    info: *mut libc::dl_phdr_info,
    _size: libc::size_t,
    data: *mut libc::c_void,
) -> libc::c_int {
    let observer = &*(data as *const ImageObserver);
    let info = &*info;

    // The main executable reports an empty name; no path is fabricated
    // for it, the record carries the unknown sentinel instead.
    let path = if info.dlpi_name.is_null() {
        None
    } else {
        CStr::from_ptr(info.dlpi_name)
            .to_str()
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    };

    let notice = RawImageNotice {
        path,
        load_address: info.dlpi_addr as u64,
        added: true,
    };

    // This frame sits under the libc iteration machinery; unwinding
    // through it is undefined.
    let _ = catch_unwind(AssertUnwindSafe(|| observer(notice)));

    0
}

impl LinkerEnv for PhdrLinker {
    fn register(&self, observer: ImageObserver) -> Result<(), EnvError> {
        {
            let mut slot = self.observer.lock();
            if slot.is_some() {
                return Err(EnvError::RegistrationRefused(
                    "an observer is already installed for this environment".to_string(),
                ));
            }
            *slot = Some(observer.clone());
        }

        // Replay the images mapped right now; this is the entirety of
        // what the platform lets us observe.
        unsafe {
            libc::dl_iterate_phdr(
                Some(visit_phdr),
                &observer as *const ImageObserver as *mut libc::c_void,
            );
        }

        Ok(())
    }

    fn unregister(&self) {
        self.observer.lock().take();
    }

    fn name(&self) -> &'static str {
        "dl_iterate_phdr"
    }
}
