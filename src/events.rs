//! Listener registries for state and event notification
//!
//! The runtime and the adapters both publish to sets of callback
//! listeners. Unsubscription happens either explicitly or when the
//! returned `Subscription` is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ListenerMap<T> = Mutex<HashMap<u64, Listener<T>>>;

/// A set of callback listeners sharing one value type
pub struct ListenerSet<T> {
    listeners: Arc<ListenerMap<T>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for ListenerSet<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T> Default for ListenerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListenerSet<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a listener. It stays registered until the subscription is
    /// dropped or `unsubscribe` is called.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("listener set poisoned")
            .insert(id, Arc::new(listener));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Notify every registered listener, synchronously, in one pass.
    ///
    /// Listeners are cloned out of the lock first so a callback may
    /// subscribe or unsubscribe reentrantly without deadlocking.
    pub fn emit(&self, value: &T) {
        let current: Vec<Listener<T>> = self
            .listeners
            .lock()
            .expect("listener set poisoned")
            .values()
            .cloned()
            .collect();
        for listener in current {
            listener(value);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().expect("listener set poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle for one registered listener; unregisters on drop
pub struct Subscription<T> {
    id: u64,
    listeners: Weak<ListenerMap<T>>,
}

impl<T> Subscription<T> {
    /// Explicitly remove the listener. Dropping has the same effect.
    pub fn unsubscribe(self) {
        // Drop impl does the work.
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .expect("listener set poisoned")
                .remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_reaches_all_listeners() {
        let set: ListenerSet<u32> = ListenerSet::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c1 = Arc::clone(&count);
        let _s1 = set.subscribe(move |v| {
            c1.fetch_add(*v as usize, Ordering::SeqCst);
        });
        let c2 = Arc::clone(&count);
        let _s2 = set.subscribe(move |v| {
            c2.fetch_add(*v as usize, Ordering::SeqCst);
        });

        set.emit(&5);
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let set: ListenerSet<u32> = ListenerSet::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        let sub = set.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(set.len(), 1);

        drop(sub);
        assert_eq!(set.len(), 0);

        set.emit(&1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let set: ListenerSet<u32> = ListenerSet::new();
        let sub = set.subscribe(|_| {});
        sub.unsubscribe();
        assert!(set.is_empty());
    }

    #[test]
    fn test_reentrant_unsubscribe_does_not_deadlock() {
        let set: ListenerSet<u32> = ListenerSet::new();
        let slot: Arc<Mutex<Option<Subscription<u32>>>> = Arc::new(Mutex::new(None));

        let slot_clone = Arc::clone(&slot);
        let sub = set.subscribe(move |_| {
            // Unsubscribes itself mid-notification.
            if let Some(s) = slot_clone.lock().unwrap().take() {
                s.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(sub);

        set.emit(&1);
        assert!(set.is_empty());
    }
}
