//! Thread-safe FIFO handing events from the transport to the simulation.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;

type Subscriber<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Mutex-guarded FIFO buffer of events.
///
/// Producers call [`push`](Self::push) from any thread; the simulation
/// thread takes everything queued so far with [`drain_all`](Self::drain_all).
/// Share it as `Arc<EventQueue<E>>`.
///
/// An optional subscriber sees every event as it is pushed. It runs while
/// the queue lock is held, so it observes events in queue order and must
/// not touch the queue itself.
pub struct EventQueue<E> {
    events: Mutex<VecDeque<E>>,
    subscriber: Option<Subscriber<E>>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventQueue<E> {
    /// Create an empty queue without a subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            subscriber: None,
        }
    }

    /// Create a queue that invokes `subscriber` on every pushed event.
    #[must_use]
    pub fn with_subscriber(subscriber: impl Fn(&E) + Send + Sync + 'static) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            subscriber: Some(Box::new(subscriber)),
        }
    }

    /// Append an event.
    pub fn push(&self, event: E) {
        let mut events = self.events.lock();
        events.push_back(event);
        if let Some(subscriber) = &self.subscriber
            && let Some(event) = events.back()
        {
            subscriber(event);
        }
    }

    /// Append several events under a single lock acquisition.
    pub fn push_batch(&self, batch: impl IntoIterator<Item = E>) {
        let mut events = self.events.lock();
        for event in batch {
            events.push_back(event);
            if let Some(subscriber) = &self.subscriber
                && let Some(event) = events.back()
            {
                subscriber(event);
            }
        }
    }

    /// Remove the oldest event.
    pub fn pop(&self) -> Option<E> {
        self.events.lock().pop_front()
    }

    /// Take every queued event in FIFO order, leaving the queue empty.
    pub fn drain_all(&self) -> Vec<E> {
        let taken = std::mem::take(&mut *self.events.lock());
        Vec::from(taken)
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl<E> fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("len", &self.len())
            .field("subscriber", &self.subscriber.is_some())
            .finish()
    }
}
