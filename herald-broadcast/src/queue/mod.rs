//! Ready and delayed queues for delivery units

pub mod delay;

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

pub use delay::DelayQueue;

use crate::types::DeliveryUnit;

/// FIFO of units ready for a send attempt, shared by all workers
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<DeliveryUnit>>,
    ready: Notify,
}

impl WorkQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue pre-filled with `units`, in order
    #[must_use]
    pub fn seeded(units: impl IntoIterator<Item = DeliveryUnit>) -> Self {
        Self {
            items: Mutex::new(units.into_iter().collect()),
            ready: Notify::new(),
        }
    }

    pub fn push(&self, unit: DeliveryUnit) {
        self.items.lock().push_back(unit);
        self.ready.notify_one();
    }

    pub fn try_pop(&self) -> Option<DeliveryUnit> {
        self.items.lock().pop_front()
    }

    /// Wait for the next unit.
    ///
    /// Cancel-safe: a unit is only removed from the queue when it is returned.
    pub async fn pop(&self) -> DeliveryUnit {
        loop {
            let notified = self.ready.notified();
            if let Some(unit) = self.try_pop() {
                return unit;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
