//! Bounded journals and drop accounting.

use crate::*;

fn bounded_tracker(limit: usize) -> (Tracker, Arc<SimulatedLinker>) {
    init_tracing();
    let env = SimulatedLinker::new();
    let tracker = Tracker::builder().env(env.clone()).max_events(limit).build();
    tracker.activate().unwrap();
    (tracker, env)
}

#[test]
fn test_events_past_capacity_are_dropped_and_counted() {
    let (tracker, linker) = bounded_tracker(3);

    for i in 0..5u64 {
        linker.load(lib(&format!("lib{i}.so")), i);
    }

    let metrics = tracker.metrics();
    assert_eq!(metrics.events_recorded, 3);
    assert_eq!(metrics.events_dropped, 2, "loss is visible, never silent");

    // The recorded prefix is intact and ordered.
    let history = tracker.history();
    assert_eq!(history.len(), 3);
    for (i, event) in history.iter().enumerate() {
        assert_eq!(event.sequence, i as u64);
    }
}

#[test]
fn test_drop_counter_is_monotonic() {
    let (tracker, linker) = bounded_tracker(1);

    linker.load(lib("kept.so"), 0x1);
    let mut last = tracker.metrics().events_dropped;
    assert_eq!(last, 0);

    for i in 0..4u64 {
        linker.load(lib(&format!("refused{i}.so")), i);
        let now = tracker.metrics().events_dropped;
        assert!(now > last);
        last = now;
    }
}

#[test]
fn test_unbounded_journal_never_drops() {
    let (tracker, linker) = quick_setup();

    for i in 0..1000u64 {
        linker.load(lib(&format!("lib{i}.so")), i);
    }

    let metrics = tracker.metrics();
    assert_eq!(metrics.events_recorded, 1000);
    assert_eq!(metrics.events_dropped, 0);
}
