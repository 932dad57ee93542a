//! Units waiting out an API-requested back-off, ordered by release time

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use parking_lot::Mutex;
use tokio::{
    sync::{Notify, futures::Notified},
    time::Instant,
};

use crate::{policy::MAX_RETRY_AFTER, types::DeliveryUnit};

#[derive(Debug)]
struct Delayed {
    release_at: Instant,
    seq: u64,
    unit: DeliveryUnit,
}

impl PartialEq for Delayed {
    fn eq(&self, other: &Self) -> bool {
        self.release_at == other.release_at && self.seq == other.seq
    }
}

impl Eq for Delayed {}

impl PartialOrd for Delayed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Delayed {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release_at
            .cmp(&other.release_at)
            .then(self.seq.cmp(&other.seq))
    }
}

#[derive(Debug, Default)]
struct Heap {
    entries: BinaryHeap<Reverse<Delayed>>,
    next_seq: u64,
}

/// Min-heap of deferred units keyed by the instant they may be retried.
///
/// Units released at the same instant come out in the order they were pushed.
#[derive(Debug, Default)]
pub struct DelayQueue {
    heap: Mutex<Heap>,
    changed: Notify,
}

impl DelayQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer `unit` by its `pending_delay`, counted from `now`.
    ///
    /// A delay that does not fit in an [`Instant`] is clamped to
    /// [`MAX_RETRY_AFTER`].
    pub fn push(&self, unit: DeliveryUnit, now: Instant) {
        let delay = unit.pending_delay.unwrap_or_default();
        let release_at = now
            .checked_add(delay)
            .or_else(|| now.checked_add(MAX_RETRY_AFTER))
            .unwrap_or(now);
        {
            let mut heap = self.heap.lock();
            let seq = heap.next_seq;
            heap.next_seq += 1;
            heap.entries.push(Reverse(Delayed {
                release_at,
                seq,
                unit,
            }));
        }
        self.changed.notify_one();
    }

    /// Earliest release time, if anything is waiting
    pub fn next_release(&self) -> Option<Instant> {
        self.heap
            .lock()
            .entries
            .peek()
            .map(|Reverse(delayed)| delayed.release_at)
    }

    /// Remove every unit whose release time is at or before `now`
    pub fn pop_due(&self, now: Instant) -> Vec<DeliveryUnit> {
        let mut heap = self.heap.lock();
        let mut due = Vec::new();

        while heap
            .entries
            .peek()
            .is_some_and(|Reverse(delayed)| delayed.release_at <= now)
        {
            if let Some(Reverse(delayed)) = heap.entries.pop() {
                due.push(delayed.unit);
            }
        }

        due
    }

    /// Resolves after the next push; create it before inspecting the queue
    pub fn changed(&self) -> Notified<'_> {
        self.changed.notified()
    }

    pub fn len(&self) -> usize {
        self.heap.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.lock().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::types::{Payload, RecipientId};

    fn deferred(id: i64, secs: u64) -> DeliveryUnit {
        let mut unit = DeliveryUnit::new(RecipientId(id), Arc::new(Payload::text("hello")));
        unit.defer(Duration::from_secs(secs));
        unit
    }

    #[test]
    fn test_releases_in_time_order() {
        let queue = DelayQueue::new();
        let now = Instant::now();

        queue.push(deferred(1, 5), now);
        queue.push(deferred(2, 1), now);
        queue.push(deferred(3, 3), now);

        assert_eq!(queue.next_release(), Some(now + Duration::from_secs(1)));
        assert!(queue.pop_due(now).is_empty());

        let due: Vec<_> = queue
            .pop_due(now + Duration::from_secs(3))
            .into_iter()
            .map(|u| u.recipient.0)
            .collect();
        assert_eq!(due, vec![2, 3]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_equal_release_times_keep_push_order() {
        let queue = DelayQueue::new();
        let now = Instant::now();

        for id in [4, 8, 15, 16] {
            queue.push(deferred(id, 2), now);
        }

        let due: Vec<_> = queue
            .pop_due(now + Duration::from_secs(2))
            .into_iter()
            .map(|u| u.recipient.0)
            .collect();
        assert_eq!(due, vec![4, 8, 15, 16]);
        assert!(queue.is_empty());
        assert_eq!(queue.next_release(), None);
    }

    #[test]
    fn test_unrepresentable_delay_is_clamped() {
        let queue = DelayQueue::new();
        let now = Instant::now();

        let mut unit = DeliveryUnit::new(RecipientId(42), Arc::new(Payload::text("hello")));
        unit.defer(Duration::MAX);
        queue.push(unit, now);

        assert_eq!(queue.next_release(), Some(now + MAX_RETRY_AFTER));
        assert!(queue.pop_due(now).is_empty());
        assert_eq!(queue.pop_due(now + MAX_RETRY_AFTER).len(), 1);
    }

    #[test]
    fn test_missing_delay_releases_immediately() {
        let queue = DelayQueue::new();
        let now = Instant::now();

        let unit = DeliveryUnit::new(RecipientId(23), Arc::new(Payload::text("hello")));
        queue.push(unit, now);

        assert_eq!(queue.pop_due(now).len(), 1);
    }
}
