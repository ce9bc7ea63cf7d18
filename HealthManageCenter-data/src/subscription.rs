//! Change notification for live queries.
//!
//! Every repository owns a [`ChangeHub`] and publishes a [`ChangeEvent`] after
//! each committed mutation. Callers register a callback and hold the returned
//! [`Subscription`]; dropping (or cancelling) the handle unsubscribes, so a
//! session that ends cannot leak stale observers. Observers must tolerate
//! redundant notifications.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// A committed mutation in one of the stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A health record was inserted or replaced for this user
    HealthRecords { user_id: i64 },
    /// A feedback row was created or its read flag changed
    Feedback { elder_id: i64, doctor_id: i64 },
    /// A reminder definition was created, updated or deleted
    Reminders { reminder_id: i64 },
}

/// Callback invoked on every published change.
pub type ChangeCallback = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

type SubscriberMap = HashMap<u64, Arc<dyn Fn(&ChangeEvent) + Send + Sync>>;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    subscribers: SubscriberMap,
}

/// Registry of live-query observers for one repository.
///
/// Cloning is cheap; clones share the same subscriber set.
#[derive(Clone, Default)]
pub struct ChangeHub {
    inner: Arc<Mutex<HubInner>>,
}

impl ChangeHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; the subscription lives until the handle is dropped.
    pub fn subscribe(&self, callback: ChangeCallback) -> Subscription {
        let mut inner = self.inner.lock().expect("change hub lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(id, Arc::from(callback));

        Subscription {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Notify every active subscriber of a committed mutation.
    pub fn publish(&self, event: &ChangeEvent) {
        // Snapshot the callbacks so a subscriber may subscribe/unsubscribe
        // from inside its own notification without deadlocking.
        let callbacks: Vec<Arc<dyn Fn(&ChangeEvent) + Send + Sync>> = {
            let inner = self.inner.lock().expect("change hub lock poisoned");
            inner.subscribers.values().cloned().collect()
        };

        for callback in callbacks {
            callback(event);
        }
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .expect("change hub lock poisoned")
            .subscribers
            .len()
    }
}

impl std::fmt::Debug for ChangeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Cancellable handle for one registered observer.
///
/// Unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    hub: Weak<Mutex<HubInner>>,
}

impl Subscription {
    /// Explicitly end the subscription (equivalent to dropping the handle)
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.hub.upgrade() {
            if let Ok(mut inner) = inner.lock() {
                inner.subscribers.remove(&self.id);
            }
        }
    }
}
