use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Insertion-ordered TTL cache with a sliding-window size bound.
///
/// When the entry count exceeds `max_entries`, only the most recent
/// `retain_entries` are kept.
pub(crate) struct TtlCache<V> {
    ttl: Duration,
    max_entries: usize,
    retain_entries: usize,
    entries: Mutex<Vec<(String, Instant, Arc<V>)>>,
}

impl<V> TtlCache<V> {
    pub(crate) fn new(ttl: Duration, max_entries: usize, retain_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            retain_entries,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<V>> {
        let entries = self.entries.lock();
        entries
            .iter()
            .rev()
            .find(|(k, inserted, _)| k == key && inserted.elapsed() < self.ttl)
            .map(|(_, _, value)| value.clone())
    }

    pub(crate) fn insert(&self, key: String, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.entries.lock();
        entries.push((key, Instant::now(), value.clone()));
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.retain_entries;
            entries.drain(..excess);
        }
        value
    }
}
