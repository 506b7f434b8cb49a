//! Retroactive replay, deactivation, and malformed notices.

use crate::*;

#[test]
fn test_images_loaded_before_activation_are_replayed() {
    init_tracing();
    let env = SimulatedLinker::with_preloaded([
        ("/usr/lib/dyld", 0x7fff_0000u64),
        ("/usr/lib/libSystem.B.dylib", 0x7fff_4000u64),
        ("/usr/lib/libc++.1.dylib", 0x7fff_8000u64),
    ]);
    let tracker = Tracker::builder().env(env).build();

    tracker.activate().unwrap();

    // Registration timing does not matter: the history is complete.
    let history = tracker.history();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|e| e.kind == EventKind::Loaded));
    assert_eq!(tracker.currently_loaded().len(), 3);
}

#[test]
fn test_deactivate_stops_recording() {
    let (tracker, linker) = quick_setup();

    linker.load(lib("liba.so"), 0x1);
    tracker.deactivate();
    linker.load(lib("libb.so"), 0x2);

    assert_eq!(tracker.history().len(), 1);

    // History stays queryable after deactivation.
    assert_eq!(tracker.currently_loaded().len(), 1);
}

#[test]
fn test_reactivation_resumes_recording() {
    let (tracker, linker) = quick_setup();

    linker.load(lib("liba.so"), 0x1);
    tracker.deactivate();
    linker.load(lib("missed.so"), 0x2);
    tracker.activate().unwrap();
    linker.load(lib("libb.so"), 0x3);

    let history = tracker.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].path, ImagePath::known(lib("libb.so")));
}

#[test]
fn test_malformed_notice_is_recorded_with_sentinel() {
    let (tracker, linker) = quick_setup();

    linker.load(lib("liba.so"), 0x1000);
    linker.emit_malformed(0xdead_beef);

    let history = tracker.history();
    assert_eq!(history.len(), 2, "malformed notices are never dropped");

    let sentinel = &history[1];
    assert_eq!(sentinel.path, ImagePath::Unknown);
    assert_eq!(sentinel.load_address, 0xdead_beef);
    assert!(!sentinel.path.to_string().is_empty(), "path is never empty");

    assert_eq!(tracker.metrics().malformed_notices, 1);
}

#[test]
fn test_malformed_notices_do_not_disturb_ordering() {
    let (tracker, linker) = quick_setup();

    linker.load(lib("liba.so"), 0x1);
    linker.emit_malformed(0x2);
    linker.load(lib("libb.so"), 0x3);

    let history = tracker.history();
    let sequences: Vec<_> = history.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);
}
