//! Observable values
//!
//! A [`Signal`] holds a value and tells subscribers when it changes. The
//! tag list view keeps its page, order direction and filter in signals, and
//! its pager labels follow the page signal.

use std::sync::{Arc, Mutex};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`Signal::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Inner<T> {
    value: T,
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback<T>)>,
}

/// Shared observable cell. Clones observe the same value.
pub struct Signal<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + Send + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> T {
        match self.inner.lock() {
            Ok(inner) => inner.value.clone(),
            Err(poisoned) => poisoned.into_inner().value.clone(),
        }
    }

    /// Replace the value; subscribers run only when it actually changed
    pub fn set(&self, value: T) {
        let callbacks = {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(poisoned) => poisoned.into_inner(),
            };
            if inner.value == value {
                return;
            }
            inner.value = value.clone();
            inner
                .subscribers
                .iter()
                .map(|(_, cb)| Arc::clone(cb))
                .collect::<Vec<_>>()
        };

        // called outside the lock so a callback may read or set the signal
        for callback in callbacks {
            callback(&value);
        }
    }

    pub fn update<F: FnOnce(&T) -> T>(&self, f: F) {
        let next = f(&self.get());
        self.set(next);
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));
        id
    }

    /// Returns false when the id was unknown
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        inner.subscribers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_set_notifies_on_change_only() {
        let signal = Signal::new(1usize);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        signal.subscribe(move |v| {
            seen.fetch_add(*v, Ordering::SeqCst);
        });

        signal.set(1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        signal.set(3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        signal.update(|v| v + 1);
        assert_eq!(calls.load(Ordering::SeqCst), 7);
        assert_eq!(signal.get(), 4);
    }

    #[test]
    fn test_unsubscribe() {
        let signal = Signal::new(String::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let id = signal.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        signal.set("a".to_string());
        assert!(signal.unsubscribe(id));
        assert!(!signal.unsubscribe(id));
        signal.set("b".to_string());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_value() {
        let signal = Signal::new(false);
        let other = signal.clone();
        other.set(true);
        assert!(signal.get());
    }
}
