//! dyld-backed linker environment for macOS and iOS.
//!
//! dyld's observer interface takes bare C function pointers with no user
//! data and offers no deregistration call, so delivery funnels through a
//! process-global forwarding slot. The raw dyld registration happens at
//! most once per process; `unregister` clears the slot (later callbacks
//! are ignored) and a re-`register` refills it, replaying the currently
//! mapped images by hand since dyld only replays on its own first
//! registration.

use crate::env::{EnvError, ImageObserver, LinkerEnv, RawImageNotice};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::ffi::CStr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Once;

/// Forwarding slot read by the C callbacks.
static SLOT: Lazy<Mutex<Option<ImageObserver>>> = Lazy::new(|| Mutex::new(None));

/// Guards the one-time raw dyld registration.
static DYLD_HOOK: Once = Once::new();

extern "C" {
    fn _dyld_register_func_for_add_image(
        func: extern "C" fn(*const libc::mach_header, libc::intptr_t),
    );
    fn _dyld_register_func_for_remove_image(
        func: extern "C" fn(*const libc::mach_header, libc::intptr_t),
    );
    fn _dyld_image_count() -> u32;
    fn _dyld_get_image_header(image_index: u32) -> *const libc::mach_header;
}

extern "C" fn add_image(mh: *const libc::mach_header, _vmaddr_slide: libc::intptr_t) {
    forward(mh, true);
}

extern "C" fn remove_image(mh: *const libc::mach_header, _vmaddr_slide: libc::intptr_t) {
    forward(mh, false);
}

/// Hand one header to the installed observer, if any.
///
/// Runs inside dyld's callback context: unwinding across this frame
/// would abort the process, so everything is fenced with `catch_unwind`.
fn forward(mh: *const libc::mach_header, added: bool) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let observer = SLOT.lock().clone();
        if let Some(observer) = observer {
            observer(notice_for(mh, added));
        }
    }));
}

/// Resolve a mach header into a raw notice via `dladdr`.
///
/// When `dladdr` cannot identify the image the notice carries no path
/// and the header address stands in for the base address; the event is
/// still delivered.
fn notice_for(mh: *const libc::mach_header, added: bool) -> RawImageNotice {
    let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
    let resolved = unsafe { libc::dladdr(mh as *const libc::c_void, &mut info) };

    if resolved == 0 {
        return RawImageNotice {
            path: None,
            load_address: mh as usize as u64,
            added,
        };
    }

    let path = if info.dli_fname.is_null() {
        None
    } else {
        unsafe { CStr::from_ptr(info.dli_fname) }
            .to_str()
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    };
    let load_address = if info.dli_fbase.is_null() {
        mh as usize as u64
    } else {
        info.dli_fbase as usize as u64
    };

    RawImageNotice {
        path,
        load_address,
        added,
    }
}

/// Replay every currently mapped image into the forwarding slot.
///
/// The count can change underneath the walk (another thread may load or
/// unload); a null header from a stale index is skipped. Best effort,
/// same as dyld's own enumeration interface.
fn replay_mapped_images() {
    let count = unsafe { _dyld_image_count() };
    for index in 0..count {
        let header = unsafe { _dyld_get_image_header(index) };
        if !header.is_null() {
            forward(header, true);
        }
    }
}

/// The dyld notification backend.
pub struct DyldLinker;

impl DyldLinker {
    /// Handle to the process-wide dyld observer interface.
    pub fn new() -> Self {
        DyldLinker
    }
}

impl Default for DyldLinker {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkerEnv for DyldLinker {
    fn register(&self, observer: ImageObserver) -> Result<(), EnvError> {
        {
            let mut slot = SLOT.lock();
            if slot.is_some() {
                return Err(EnvError::RegistrationRefused(
                    "a dyld observer is already installed in this process".to_string(),
                ));
            }
            *slot = Some(observer);
        }

        let mut hooked_now = false;
        DYLD_HOOK.call_once(|| {
            hooked_now = true;
            // dyld replays the add-image callback for every image that is
            // already mapped, synchronously, inside this call.
            unsafe {
                _dyld_register_func_for_add_image(add_image);
                _dyld_register_func_for_remove_image(remove_image);
            }
        });

        if !hooked_now {
            // Re-registration after unregister: dyld will not replay, so
            // walk the mapped images ourselves.
            replay_mapped_images();
        }

        Ok(())
    }

    fn unregister(&self) {
        SLOT.lock().take();
    }

    fn name(&self) -> &'static str {
        "dyld"
    }
}
