//! Broadcast feed with a retained last value
//!
//! Services publish full collection snapshots; components subscribe and
//! immediately observe current state, then every later update. Built on
//! `tokio::sync::watch`, which keeps exactly the last published value.

use tokio::sync::watch;

/// A publish/subscribe channel retaining the last-emitted value
#[derive(Debug)]
pub struct Feed<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Feed<T> {
    /// Create a feed seeded with an initial value
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the retained value and wake subscribers
    ///
    /// Publishing with zero subscribers still updates the retained value,
    /// so late subscribers never miss the current state.
    pub fn publish(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Subscribe; the receiver starts out holding the current value
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Clone of the currently retained value
    pub fn latest(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T: Clone + Default> Default for Feed<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
