// Multicast, replay-latest channel for snapshot change notifications.
//
// Purpose
// - Keep a registry of observers plus the most recently published value.
// - Deliver that value to a new observer before subscribe returns, and the
//   next value to every observer, in registration order, on each publish.
//
// Responsibilities
// - Observers are independent: cancelling one never affects the others, and a
//   panicking observer is isolated so the rest of the fan-out still runs.
// - Dropping a Subscription cancels it; no further deliveries afterwards.
//
// Boundaries
// - Delivery is synchronous and runs under the registry lock, consistent with
//   the single-threaded cooperative model: an observer must not subscribe,
//   cancel, or mutate the store from inside its callback.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::warn;

type Observer<T> = Box<dyn FnMut(T) + Send>;

struct Registry<T> {
    latest: T,
    next_id: u64,
    observers: Vec<(u64, Observer<T>)>,
}

pub struct Broadcaster<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: Clone> Broadcaster<T> {
    pub fn new(initial: T) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                latest: initial,
                next_id: 0,
                observers: Vec::new(),
            })),
        }
    }

    /// The most recently published value (or the initial one).
    pub fn latest(&self) -> T {
        lock(&self.registry).latest.clone()
    }

    /// Registers `observer` and replays the latest value to it before returning.
    pub fn subscribe(&self, observer: impl FnMut(T) + Send + 'static) -> Subscription<T> {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        let mut observer: Observer<T> = Box::new(observer);
        observer(registry.latest.clone());
        registry.observers.push((id, observer));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Caches `value` as the latest and fans it out in registration order.
    /// A panicking observer is contained so later observers still receive
    /// the delivery.
    pub fn publish(&self, value: T) {
        let mut registry = lock(&self.registry);
        registry.latest = value.clone();
        for (id, observer) in registry.observers.iter_mut() {
            let delivery = catch_unwind(AssertUnwindSafe(|| observer(value.clone())));
            if delivery.is_err() {
                warn!(observer = *id, "observer panicked during delivery");
            }
        }
    }
}

fn lock<T>(registry: &Mutex<Registry<T>>) -> MutexGuard<'_, Registry<T>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle for one registration. Cancelling (or dropping) it stops further
/// deliveries to that observer only.
pub struct Subscription<T> {
    id: u64,
    registry: Weak<Mutex<Registry<T>>>,
}

impl<T> Subscription<T> {
    pub fn cancel(self) {
        // Drop does the work.
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.observers.retain(|(id, _)| *id != self.id);
        }
    }
}
