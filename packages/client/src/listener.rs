//! Local listener fan-out.

use std::{
    collections::HashMap,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, MutexGuard, Weak},
};

use serde_json::Value;

type Callback = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_event: HashMap<String, Vec<(u64, Callback)>>,
}

impl Listeners {
    fn contains(&self, event: &str, id: u64) -> bool {
        self.by_event
            .get(event)
            .is_some_and(|entries| entries.iter().any(|(entry_id, _)| *entry_id == id))
    }
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    // Callbacks never run under the lock, a poisoned guard still holds a consistent map
    listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Callbacks keyed by event name, invoked in registration order.
///
/// A panicking callback is logged and skipped; the remaining callbacks for the
/// same event still receive it.
#[derive(Default, Clone)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<Listeners>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, event: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut listeners = lock(&self.inner);
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners
            .by_event
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(callback)));

        Subscription {
            registry: Arc::downgrade(&self.inner),
            event: event.to_string(),
            id,
        }
    }

    /// Deliver `data` to every callback registered for `event`.
    ///
    /// Returns how many callbacks completed without panicking.
    pub fn dispatch(&self, event: &str, data: &Value) -> usize {
        let snapshot: Vec<(u64, Callback)> = match lock(&self.inner).by_event.get(event) {
            Some(entries) => entries.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        for (id, callback) in snapshot {
            // An earlier callback may have unsubscribed this one
            if !lock(&self.inner).contains(event, id) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| callback(data))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!("Listener for '{}' panicked: {}", event, reason);
                }
            }
        }
        delivered
    }

    pub fn count(&self, event: &str) -> usize {
        lock(&self.inner).by_event.get(event).map_or(0, Vec::len)
    }

    pub fn clear(&self) {
        lock(&self.inner).by_event.clear();
    }
}

/// Handle returned by [`ListenerRegistry::subscribe`]
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Mutex<Listeners>>,
    event: String,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let mut listeners = lock(&inner);
        if let Some(entries) = listeners.by_event.get_mut(&self.event) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                listeners.by_event.remove(&self.event);
            }
        }
    }
}
