//! Live delivery of journal records to consumers.

use crate::journal::EventJournal;
use loadtrail_core::ImageEvent;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Weak;

/// Journal-side half of a subscription.
pub(crate) struct SubscriberSlot {
    id: u64,
    tx: Sender<ImageEvent>,
}

impl SubscriberSlot {
    pub(crate) fn new(id: u64, tx: Sender<ImageEvent>) -> Self {
        SubscriberSlot { id, tx }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Deliver one event. Returns `false` once the consumer is gone, so
    /// the journal can retire the slot.
    pub(crate) fn send(&self, event: ImageEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// A live, ordered, unbounded stream of future journal records.
///
/// Each subscription sees only records appended after it was created,
/// in ascending sequence order with no duplication or reordering.
/// Delivery is decoupled from the appending thread: events queue in the
/// channel until the consumer takes them.
///
/// Iterate to block for events, or poll with
/// [`try_next`](Subscription::try_next). Dropping the subscription (or
/// calling [`cancel`](Subscription::cancel)) ceases delivery and releases
/// the journal-side slot; the journal and other subscribers are
/// unaffected.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    first_sequence: u64,
    rx: Receiver<ImageEvent>,
    journal: Weak<EventJournal>,
}

impl Subscription {
    pub(crate) fn new(
        id: u64,
        first_sequence: u64,
        rx: Receiver<ImageEvent>,
        journal: Weak<EventJournal>,
    ) -> Self {
        Subscription {
            id,
            first_sequence,
            rx,
            journal,
        }
    }

    /// Sequence number of the first record this subscription can see.
    ///
    /// Equal to one past the journal tail at subscription time; a
    /// snapshot taken before subscribing ends exactly here, so the two
    /// views compose without gap or overlap.
    pub fn first_sequence(&self) -> u64 {
        self.first_sequence
    }

    /// Block until the next record arrives.
    ///
    /// Returns `None` once the journal has been dropped and the queue is
    /// drained.
    pub fn recv(&self) -> Option<ImageEvent> {
        self.rx.recv().ok()
    }

    /// Take the next record if one is already queued.
    pub fn try_next(&self) -> Option<ImageEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Stop receiving. Equivalent to dropping the subscription.
    pub fn cancel(self) {}
}

impl Iterator for Subscription {
    type Item = ImageEvent;

    fn next(&mut self) -> Option<ImageEvent> {
        self.recv()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(journal) = self.journal.upgrade() {
            journal.unsubscribe(self.id);
        }
    }
}
