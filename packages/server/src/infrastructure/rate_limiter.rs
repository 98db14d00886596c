//! In-memory keyed rate limiter.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use siaga_shared::time::Clock;

use crate::domain::{RateLimitEntry, RateLimitPolicy};

/// Entries are only evicted once the table grows past this size
const EVICTION_THRESHOLD: usize = 10_000;

/// Fixed-window limiter keyed by caller identity (typically the peer IP).
///
/// Each check is a single critical section on a `std` mutex with no await
/// point inside, so a window reset is never observed half-done.
pub struct InMemoryRateLimiter {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl InMemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Check whether a request from `key` is allowed and count it.
    pub fn allow(&self, key: &str) -> bool {
        let now = self.clock.now_millis();
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("rate limiter lock poisoned, recovering with stale state");
                poisoned.into_inner()
            }
        };

        // Idle callers are dropped lazily; they get a fresh window on return.
        if entries.len() > EVICTION_THRESHOLD {
            let policy = self.policy;
            entries.retain(|_, entry| !entry.is_expired(now, &policy));
        }

        match entries.get_mut(key) {
            Some(entry) => entry.register(now, &self.policy),
            None => {
                entries.insert(key.to_string(), RateLimitEntry::open(now));
                true
            }
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}
