//! In-process cache namespace. Entries expire passively: nothing purges them,
//! a read past the deadline is simply a miss.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry {
    value: String,
    dead_time: Instant,
}

#[derive(Default)]
pub struct InProcessCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InProcessCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .filter(|entry| entry.dead_time > now)
            .map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: &str, value: &str, ttl: Duration) {
        let entry = CacheEntry {
            value: value.to_string(),
            dead_time: Instant::now() + ttl,
        };
        self.entries.write().insert(key.to_string(), entry);
    }

    /// Number of stored entries, expired ones included.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
