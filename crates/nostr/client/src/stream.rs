//! Publish-subscribe streams.
//!
//! A [`MessageStream`] fans every published item out to its current
//! observers. Observers either register a callback or receive items on a
//! bounded channel. Publishing is synchronous: callbacks run on the
//! publishing thread, in subscription order.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::mpsc;
use tracing::warn;

/// Callback type for stream observers.
pub type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Observers<T> {
    next_id: u64,
    entries: Vec<(u64, Observer<T>)>,
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<T> Detach for Mutex<Observers<T>> {
    fn detach(&self, id: u64) {
        let mut observers = self.lock().unwrap_or_else(PoisonError::into_inner);
        observers.entries.retain(|(entry_id, _)| *entry_id != id);
    }
}

/// A multicast stream of `T`.
pub struct MessageStream<T> {
    observers: Arc<Mutex<Observers<T>>>,
}

impl<T: 'static> MessageStream<T> {
    /// Create a stream with no observers.
    pub fn new() -> Self {
        Self {
            observers: Arc::new(Mutex::new(Observers {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a callback. The callback stays registered until the
    /// returned subscription is dropped.
    pub fn subscribe<F>(&self, observer: F) -> StreamSubscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let observer: Observer<T> = Arc::new(observer);
        let mut observers = self.lock();
        let id = observers.next_id;
        observers.next_id += 1;
        observers.entries.push((id, observer));
        drop(observers);

        let stream: Weak<dyn Detach> = Arc::downgrade(&self.observers) as Weak<dyn Detach>;
        StreamSubscription { id, stream }
    }

    /// Receive items on a bounded channel.
    ///
    /// Items are delivered with `try_send`; when the consumer falls behind
    /// and the channel is full, the item is dropped and a warning is logged.
    pub fn subscribe_channel(&self, capacity: usize) -> (StreamSubscription, mpsc::Receiver<T>)
    where
        T: Clone + Send,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let subscription = self.subscribe(move |item: &T| match tx.try_send(item.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("stream channel full - consumer too slow, dropping item");
            }
            // receiver dropped; the owner of the subscription will detach it
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        });
        (subscription, rx)
    }

    /// Deliver an item to every current observer.
    pub fn publish(&self, item: &T) {
        let snapshot: Vec<Observer<T>> = self
            .lock()
            .entries
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in snapshot {
            observer(item);
        }
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.lock().entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Observers<T>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: 'static> Default for MessageStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for MessageStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStream")
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// Handle for a registered observer. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct StreamSubscription {
    id: u64,
    stream: Weak<dyn Detach>,
}

impl StreamSubscription {
    /// Unsubscribe now.
    pub fn unsubscribe(self) {}

    /// Whether the stream this subscription belongs to still exists.
    pub fn is_attached(&self) -> bool {
        self.stream.strong_count() > 0
    }
}

impl Drop for StreamSubscription {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.upgrade() {
            stream.detach(self.id);
        }
    }
}

impl fmt::Debug for StreamSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSubscription")
            .field("id", &self.id)
            .field("attached", &self.is_attached())
            .finish()
    }
}
