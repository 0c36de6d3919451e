//! Snapshot listener registry for push backends.
//!
//! # Invariants
//! - Listeners are invoked in registration order.
//! - Broadcasts never run while the registry lock is held, so a listener may
//!   subscribe or unsubscribe from inside its callback.
//! - Dropping a `Subscription` detaches its listener; later broadcasts skip it.

use crate::model::task::Task;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Callback receiving the full current collection.
pub type SnapshotListener = Arc<dyn Fn(&[Task]) + Send + Sync>;

/// Registered listeners of one push backend.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, SnapshotListener)>>,
}

impl ListenerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds `listener` and returns the guard that detaches it.
    pub fn add(self: &Arc<Self>, listener: SnapshotListener) -> Subscription {
        let listener_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((listener_id, listener));
        Subscription {
            registry: Arc::downgrade(self),
            listener_id,
        }
    }

    /// Delivers `snapshot` to every registered listener.
    pub fn broadcast(&self, snapshot: &[Task]) {
        let listeners: Vec<SnapshotListener> = self
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn remove(&self, listener_id: u64) {
        self.lock().retain(|(id, _)| *id != listener_id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(u64, SnapshotListener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live subscription handle; dropping it unsubscribes.
#[must_use = "dropping a subscription immediately stops snapshot delivery"]
pub struct Subscription {
    registry: Weak<ListenerRegistry>,
    listener_id: u64,
}

impl Subscription {
    /// Detaches the listener explicitly.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.listener_id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("listener_id", &self.listener_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ListenerRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn dropped_subscription_stops_delivery() {
        let registry = ListenerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = registry.add(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        registry.broadcast(&[]);
        subscription.unsubscribe();
        registry.broadcast(&[]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }
}
