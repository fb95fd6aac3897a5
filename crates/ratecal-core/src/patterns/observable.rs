//! Observer / Observable pattern.
//!
//! * An **Observable** object notifies registered **Observer**s whenever it
//!   changes state.
//! * Observers react by calling `update()`.
//!
//! Market quotes are observable; calibration helpers observe them so that
//! cached market values are invalidated when a quote moves. The observer
//! list lives behind a `Mutex` so that observables can be shared across
//! threads.

use std::sync::{Arc, Mutex, Weak};

/// An object that can notify interested parties when it changes.
///
/// All methods take `&self` (not `&mut self`) to support shared ownership.
pub trait Observable {
    /// Register an observer to receive future change notifications.
    fn register_observer(&self, observer: Weak<dyn Observer>);

    /// Remove a previously registered observer.
    fn unregister_observer(&self, observer: &Weak<dyn Observer>);

    /// Notify all currently registered observers that this object has changed.
    fn notify_observers(&self);
}

/// An object that reacts to changes in [`Observable`]s it has subscribed to.
pub trait Observer: Send + Sync {
    /// Called by every observable this observer is registered with when that
    /// observable changes state.
    fn update(&self);
}

/// Observer-list bookkeeping that can be embedded in any observable type.
#[derive(Default)]
pub struct ObservableImpl {
    observers: Mutex<Vec<Weak<dyn Observer>>>,
}

impl ObservableImpl {
    /// Create a new, empty observable implementation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer.
    pub fn register(&self, observer: Weak<dyn Observer>) {
        self.lock().push(observer);
    }

    /// Remove an observer (by pointer equality of the `Weak`).
    pub fn unregister(&self, observer: &Weak<dyn Observer>) {
        self.lock().retain(|o| !Weak::ptr_eq(o, observer));
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.lock().iter().filter(|w| w.strong_count() > 0).count()
    }

    /// Notify all live observers, removing dead `Weak` references as we go.
    pub fn notify(&self) {
        let live: Vec<Arc<dyn Observer>> = {
            let mut observers = self.lock();
            observers.retain(|w| w.strong_count() > 0);
            observers.iter().filter_map(|w| w.upgrade()).collect()
        };
        // Observers may call back into this observable.
        for obs in live {
            obs.update();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Weak<dyn Observer>>> {
        // A panic inside an observer cannot leave the list inconsistent.
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ObservableImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableImpl")
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingObserver {
        count: AtomicU32,
    }

    impl Observer for CountingObserver {
        fn update(&self) {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn counter() -> Arc<CountingObserver> {
        Arc::new(CountingObserver {
            count: AtomicU32::new(0),
        })
    }

    #[test]
    fn register_and_notify() {
        let obs = counter();
        let observable = ObservableImpl::new();
        observable.register(Arc::downgrade(&obs) as Weak<dyn Observer>);
        observable.notify();
        assert_eq!(obs.count.load(Ordering::Relaxed), 1);
        observable.notify();
        assert_eq!(obs.count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn dead_observer_pruned() {
        let observable = ObservableImpl::new();
        {
            let obs = counter();
            observable.register(Arc::downgrade(&obs) as Weak<dyn Observer>);
            assert_eq!(observable.observer_count(), 1);
        }
        observable.notify();
        assert_eq!(observable.observer_count(), 0);
    }

    #[test]
    fn unregister() {
        let obs = counter();
        let weak = Arc::downgrade(&obs) as Weak<dyn Observer>;
        let observable = ObservableImpl::new();
        observable.register(weak.clone());
        observable.unregister(&weak);
        observable.notify();
        assert_eq!(obs.count.load(Ordering::Relaxed), 0);
    }
}
