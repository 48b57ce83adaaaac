//! Bounded delivery queues
//!
//! Each category queue is single-producer (the router, serialized per
//! connection) and hands out independent [`Subscription`]s, each with its own
//! bounded buffer. A subscription only sees events published after it was
//! created; detaching is dropping the handle. What happens when a buffer is
//! full is decided by a per-subscription [`QueuePolicy`], so the note queue
//! can keep on/off pairing intact while the others just shed their oldest
//! event.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::protocol::metrics::Metrics;

/// Overflow behavior of one subscription buffer.
pub(crate) trait QueuePolicy<T>: Send {
    /// Make room in a full buffer for `incoming`. Return `false` to drop the
    /// incoming event instead; on `true` exactly one buffered event must have
    /// been removed.
    fn make_room(&mut self, queue: &mut VecDeque<T>, incoming: &T) -> bool;

    /// Observe an event the moment it is handed to the consumer.
    fn on_delivered(&mut self, _event: &T) {}
}

/// Plain drop-oldest: the newest event always wins a slot.
pub(crate) struct DropOldest;

impl<T> QueuePolicy<T> for DropOldest {
    fn make_room(&mut self, queue: &mut VecDeque<T>, _incoming: &T) -> bool {
        queue.pop_front();
        true
    }
}

struct Inner<T> {
    queue: VecDeque<T>,
    policy: Box<dyn QueuePolicy<T>>,
    closed: bool,
    detached: bool,
    dropped: u64,
}

struct Shared<T> {
    inner: Mutex<Inner<T>>,
    available: Condvar,
    capacity: usize,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().expect("subscription mutex poisoned")
    }
}

/// Publisher side of one delivery category.
pub(crate) struct Topic<T> {
    subscribers: Vec<Arc<Shared<T>>>,
    capacity: usize,
    make_policy: fn() -> Box<dyn QueuePolicy<T>>,
}

impl<T: Clone> Topic<T> {
    pub(crate) fn new(capacity: usize, make_policy: fn() -> Box<dyn QueuePolicy<T>>) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        Self {
            subscribers: Vec::new(),
            capacity,
            make_policy,
        }
    }

    /// Create a subscription that sees events from this point forward.
    pub(crate) fn subscribe(&mut self) -> Subscription<T> {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(self.capacity),
                policy: (self.make_policy)(),
                closed: false,
                detached: false,
                dropped: 0,
            }),
            available: Condvar::new(),
            capacity: self.capacity,
        });
        self.subscribers.push(Arc::clone(&shared));
        Subscription { shared }
    }

    /// Deliver one event to every live subscription, applying each buffer's
    /// overflow policy. Detached subscriptions are pruned here.
    pub(crate) fn publish(&mut self, event: &T) {
        self.subscribers.retain(|shared| {
            let mut inner = shared.lock();
            if inner.detached {
                return false;
            }
            if inner.queue.len() >= shared.capacity {
                let Inner { queue, policy, .. } = &mut *inner;
                let made_room = policy.make_room(queue, event);
                inner.dropped += 1;
                Metrics::record_dropped_events(1);
                if !made_room {
                    trace!("incoming event dropped by overflow policy");
                    return true;
                }
            }
            inner.queue.push_back(event.clone());
            drop(inner);
            shared.available.notify_one();
            true
        });
    }

    /// Mark every subscription closed and wake blocked readers. Buffered
    /// events stay readable until drained.
    pub(crate) fn close(&mut self) {
        for shared in &self.subscribers {
            shared.lock().closed = true;
            shared.available.notify_all();
        }
        self.subscribers.clear();
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Consumer handle for one delivery category.
///
/// Reads never block indefinitely: [`try_recv`](Self::try_recv) returns
/// immediately and [`recv_timeout`](Self::recv_timeout) waits at most the
/// caller's bound. Dropping the handle detaches it; the publisher prunes
/// detached buffers on its next delivery.
pub struct Subscription<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Subscription<T> {
    /// Take the next buffered event, or `None` if the buffer is empty.
    pub fn try_recv(&self) -> Option<T> {
        let mut inner = self.shared.lock();
        let Inner { queue, policy, .. } = &mut *inner;
        let event = queue.pop_front();
        if let Some(event) = &event {
            policy.on_delivered(event);
        }
        event
    }

    /// Take the next event, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` on timeout, or immediately once the queue is closed
    /// and drained.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.shared.lock();
        loop {
            let Inner { queue, policy, .. } = &mut *inner;
            if let Some(event) = queue.pop_front() {
                policy.on_delivered(&event);
                return Some(event);
            }
            if inner.closed {
                return None;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, _) = self
                .shared
                .available
                .wait_timeout(inner, remaining)
                .expect("subscription mutex poisoned");
            inner = guard;
        }
    }

    /// Number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Whether the buffer is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the owning connection has terminated. Buffered events remain
    /// readable.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Number of events this subscription has lost to overflow.
    #[must_use]
    pub fn overflow_count(&self) -> u64 {
        self.shared.lock().dropped
    }

    /// Maximum number of buffered events.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.shared.lock().detached = true;
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("Subscription")
            .field("len", &inner.queue.len())
            .field("capacity", &self.shared.capacity)
            .field("closed", &inner.closed)
            .field("dropped", &inner.dropped)
            .finish()
    }
}
