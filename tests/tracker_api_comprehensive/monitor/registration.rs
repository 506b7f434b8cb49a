//! Observer registration: idempotence and refusal.

use crate::*;

#[test]
fn test_activate_twice_registers_one_observer() {
    let (tracker, linker) = quick_setup();

    tracker.activate().unwrap();
    tracker.activate().unwrap();

    assert_eq!(
        linker.registrations(),
        1,
        "repeat activation must not double-register"
    );
}

#[test]
fn test_many_consumers_activating_is_still_one_registration() {
    let (tracker, linker) = quick_setup();
    let tracker = Arc::new(tracker);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tracker = Arc::clone(&tracker);
            std::thread::spawn(move || tracker.activate())
        })
        .collect();

    for h in handles {
        h.join().unwrap().unwrap();
    }

    assert_eq!(linker.registrations(), 1);
}

#[test]
fn test_second_tracker_on_same_environment_is_refused() {
    init_tracing();
    let env = SimulatedLinker::new();

    let first = Tracker::builder().env(env.clone()).build();
    first.activate().unwrap();

    // The process has a single observation channel; a competing tracker
    // cannot claim it.
    let second = Tracker::builder().env(env.clone()).build();
    let err = second.activate().unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, Error::RegistrationFailed(_)));
}

#[test]
fn test_refused_registration_does_not_crash_or_record() {
    init_tracing();
    let env = SimulatedLinker::new();
    env.refuse_registration();

    let tracker = Tracker::builder().env(env.clone()).build();
    let err = tracker.activate().unwrap_err();
    assert!(err.is_fatal());

    env.load("/usr/lib/liba.so", 0x1000);
    assert!(tracker.history().is_empty(), "nothing records while refused");

    // Once the environment recovers, activation works and the observer
    // registers cleanly.
    env.allow_registration();
    tracker.activate().unwrap();
    env.load("/usr/lib/libb.so", 0x2000);
    assert_eq!(tracker.history().len(), 1);
}
