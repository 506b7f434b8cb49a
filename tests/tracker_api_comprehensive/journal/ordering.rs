//! Sequence ordering, snapshots, and cursor reads.

use crate::*;

#[test]
fn test_history_is_ordered_and_gap_free() {
    let (tracker, linker) = quick_setup();

    for i in 0..50u64 {
        linker.load(lib(&format!("lib{i}.so")), 0x1000 + i);
    }

    let history = tracker.history();
    assert_eq!(history.len(), 50);
    for (i, event) in history.iter().enumerate() {
        assert_eq!(event.sequence, i as u64, "no gaps, no reordering");
    }
}

#[test]
fn test_first_event_is_sequence_zero() {
    let (tracker, linker) = quick_setup();
    linker.load(lib("liba.so"), 0x1000);
    assert_eq!(tracker.history()[0].sequence, 0);
}

#[test]
fn test_events_since_returns_strictly_newer() {
    let (tracker, linker) = quick_setup();

    for i in 0..10u64 {
        linker.load(lib(&format!("lib{i}.so")), i);
    }

    let newer = tracker.events_since(6);
    assert_eq!(newer.len(), 3);
    assert_eq!(newer[0].sequence, 7);
    assert_eq!(newer[2].sequence, 9);

    assert!(tracker.events_since(9).is_empty());
    assert!(tracker.events_since(u64::MAX).is_empty());
}

#[test]
fn test_cursor_polling_sees_everything_once() {
    let (tracker, linker) = quick_setup();

    linker.load(lib("liba.so"), 0x1);
    linker.load(lib("libb.so"), 0x2);

    let first_page = tracker.history();
    let cursor = first_page.last().unwrap().sequence;

    linker.unload(lib("liba.so"), 0x1);
    linker.load(lib("libc.so"), 0x3);

    let second_page = tracker.events_since(cursor);
    assert_eq!(second_page.len(), 2);
    assert_eq!(second_page[0].sequence, cursor + 1);

    // Union of the two pages covers the full history exactly.
    let mut all: Vec<_> = first_page;
    all.extend(second_page);
    assert_eq!(all, tracker.history());
}

#[test]
fn test_snapshot_and_subscription_compose_without_gap_or_overlap() {
    let (tracker, linker) = quick_setup();

    linker.load(lib("early1.so"), 0x1);
    linker.load(lib("early2.so"), 0x2);

    let snapshot = tracker.history();
    let updates = tracker.live_updates().unwrap();
    assert_eq!(
        updates.first_sequence(),
        snapshot.last().unwrap().sequence + 1,
        "the live view starts exactly where the snapshot ends"
    );

    linker.load(lib("late.so"), 0x3);

    let live: Vec<_> = std::iter::from_fn(|| updates.try_next()).collect();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].sequence, snapshot.len() as u64);
}

#[test]
fn test_timestamps_never_go_backwards() {
    let (tracker, linker) = quick_setup();

    for i in 0..20u64 {
        linker.load(lib(&format!("lib{i}.so")), i);
    }

    let history = tracker.history();
    for pair in history.windows(2) {
        assert!(pair[1].timestamp >= pair[0].timestamp);
    }
}
