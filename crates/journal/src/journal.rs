//! The append-only event store.

use crate::subscription::{SubscriberSlot, Subscription};
use loadtrail_core::{now_millis, EventKind, ImageEvent, ImagePath, TrackError, TrackResult};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Append-only, thread-safe ordered store of [`ImageEvent`]s.
///
/// The journal is the single point of serialization for the system: the
/// linker's notification thread appends while application threads read.
///
/// # Thread Safety
///
/// Appends take the write lock for the whole insert-and-fan-out step.
/// Without that, the following reordering can occur:
/// 1. A1 pushes record 5, releases the lock
/// 2. A2 pushes record 6, sends 6 to subscriber S
/// 3. A1 sends 5 to subscriber S
///
/// Holding the write lock across the subscriber sends rules this out, so
/// every subscriber observes ascending sequence numbers. Readers take the
/// read lock and can never observe a half-written record.
pub struct EventJournal {
    /// Ordered records; index == sequence number.
    records: RwLock<Vec<ImageEvent>>,

    /// Live subscriber channels. Locked after `records` on the append
    /// path and on the subscribe path, never in the other order.
    subscribers: Mutex<Vec<SubscriberSlot>>,

    /// Next subscription id.
    next_subscriber: AtomicU64,

    /// Events refused because the journal was full.
    ///
    /// Monotonically increasing; this is the only data-loss accounting
    /// in the system and is exposed to consumers via [`dropped`].
    ///
    /// [`dropped`]: EventJournal::dropped
    dropped: AtomicU64,

    /// Maximum number of records the journal will hold.
    capacity: usize,
}

impl EventJournal {
    /// Create an unbounded journal.
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// Create a journal that refuses appends past `capacity` records.
    ///
    /// A refused append returns `ResourceExhausted` and increments the
    /// drop counter; it never partially inserts.
    pub fn with_capacity(capacity: usize) -> Self {
        EventJournal {
            records: RwLock::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            next_subscriber: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            capacity,
        }
    }

    /// Append an event, assigning the next sequence number.
    ///
    /// Sequence numbers are assigned under the write lock and equal the
    /// journal length at insertion time, so they are strictly increasing
    /// and gap-free for the life of the process.
    ///
    /// # Errors
    ///
    /// - `ResourceExhausted`: the journal is at capacity. The event is
    ///   dropped and [`dropped`](EventJournal::dropped) increments.
    pub fn append(
        &self,
        kind: EventKind,
        path: ImagePath,
        load_address: u64,
    ) -> TrackResult<u64> {
        let mut records = self.records.write();

        if records.len() >= self.capacity {
            self.dropped.fetch_add(1, Ordering::SeqCst);
            warn!(
                capacity = self.capacity,
                %path,
                "journal full, image event dropped"
            );
            return Err(TrackError::ResourceExhausted {
                what: "journal",
                limit: self.capacity,
            });
        }

        let sequence = records.len() as u64;
        let event = ImageEvent {
            sequence,
            kind,
            path,
            load_address,
            timestamp: now_millis(),
        };
        debug!(sequence, ?kind, path = %event.path, "image event recorded");
        records.push(event.clone());

        // Fan out while still holding the write lock; see the type docs.
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|slot| slot.send(event.clone()));

        Ok(sequence)
    }

    /// Ordered copy of all records from sequence 0 to the current tail.
    ///
    /// Consistent at the instant of the call: no partial record, no
    /// record twice.
    pub fn snapshot(&self) -> Vec<ImageEvent> {
        self.records.read().clone()
    }

    /// All records with sequence strictly greater than `cursor`.
    ///
    /// Because sequences are gap-free, `since(snapshot().last().sequence)`
    /// returns exactly the records appended after that snapshot.
    pub fn since(&self, cursor: u64) -> Vec<ImageEvent> {
        let records = self.records.read();
        let start = usize::try_from(cursor.saturating_add(1)).unwrap_or(usize::MAX);
        records.get(start..).map(<[_]>::to_vec).unwrap_or_default()
    }

    /// Subscribe to records appended after this call.
    ///
    /// The returned [`Subscription`] yields events in ascending sequence
    /// order with no duplication. Events appended before the call are not
    /// delivered; combine with [`snapshot`](EventJournal::snapshot) for a
    /// consistent historical-plus-live view. Dropping the subscription
    /// ceases delivery without affecting the journal or other
    /// subscribers.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        // Holding the read lock here means an in-flight append either
        // completed its fan-out before we register (we miss it, but a
        // snapshot taken afterwards contains it) or has not started (we
        // receive it). Nothing can be both missed and unsnapshotted.
        let records = self.records.read();
        let first_sequence = records.len() as u64;
        let (tx, rx) = mpsc::channel();
        let id = self.next_subscriber.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().push(SubscriberSlot::new(id, tx));
        drop(records);

        Subscription::new(id, first_sequence, rx, Arc::downgrade(self))
    }

    /// Remove a subscriber; no-op if it is already gone.
    pub(crate) fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().retain(|slot| slot.id() != id);
    }

    /// Number of records in the journal.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the journal holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Sequence number of the newest record, or `None` if empty.
    pub fn last_sequence(&self) -> Option<u64> {
        self.records.read().last().map(|e| e.sequence)
    }

    /// Monotonically increasing count of events dropped at capacity.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Discard all records and restart sequence numbering.
    ///
    /// Only compiled into test builds; production journals are
    /// append-only for the process lifetime.
    #[cfg(test)]
    pub fn reset(&self) {
        self.records.write().clear();
    }
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new()
    }
}
