use std::collections::{HashSet, VecDeque};

/// At-most-once delivery per distinct fingerprint within one epoch.
///
/// The cache is cleared at the start of every cycle, so "already sent" is
/// re-derived from that cycle's own deliveries; a value change on the site
/// always produces a new fingerprint and therefore a new send. Insertion
/// order is tracked for FIFO trimming so the cache stays bounded under
/// pathological churn.
#[derive(Debug)]
pub struct SentSignalCache {
    seen: HashSet<String>,
    order: VecDeque<String>,
    limit: usize,
}

impl SentSignalCache {
    pub fn new(limit: usize) -> Self {
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
            limit,
        }
    }

    pub fn clear(&mut self) {
        self.seen.clear();
        self.order.clear();
    }

    pub fn has(&self, fingerprint: &str) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Record a delivered fingerprint. Returns false if it was already
    /// present (the insert is then a no-op).
    pub fn insert(&mut self, fingerprint: String) -> bool {
        if self.seen.contains(&fingerprint) {
            return false;
        }
        self.seen.insert(fingerprint.clone());
        self.order.push_back(fingerprint);
        true
    }

    /// Drop oldest entries until at most `limit` remain.
    pub fn trim(&mut self) {
        while self.order.len() > self.limit {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_insert_is_a_noop() {
        let mut cache = SentSignalCache::new(50);
        assert!(cache.insert("a-1-92-40-70-90".into()));
        assert!(!cache.insert("a-1-92-40-70-90".into()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_resets_the_epoch() {
        let mut cache = SentSignalCache::new(50);
        cache.insert("a".into());
        cache.clear();
        assert!(!cache.has("a"));
        assert!(cache.insert("a".into()));
    }

    #[test]
    fn trim_keeps_most_recent() {
        let mut cache = SentSignalCache::new(50);
        for i in 0..60 {
            cache.insert(format!("key-{i}"));
        }
        cache.trim();
        assert_eq!(cache.len(), 50);
        // The ten oldest are gone, the most recent survive.
        assert!(!cache.has("key-0"));
        assert!(!cache.has("key-9"));
        assert!(cache.has("key-10"));
        assert!(cache.has("key-59"));
    }
}
