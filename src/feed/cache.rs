use std::collections::HashMap;
use std::sync::Arc;

use crate::model::Article;

/// Result of the last successful fetch for one category.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub category: String,
    pub fetched_at_ms: i64,
    pub articles: Arc<Vec<Article>>,
}

impl CacheEntry {
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.fetched_at_ms)
    }
}

/// Per-category response cache with a fixed time-to-live.
///
/// Entries are only ever overwritten by a newer fetch; staleness is decided
/// at lookup time from the caller's clock.
#[derive(Debug)]
pub struct CategoryCache {
    ttl_ms: i64,
    entries: HashMap<String, CacheEntry>,
}

impl CategoryCache {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            ttl_ms: ttl.num_milliseconds(),
            entries: HashMap::new(),
        }
    }

    /// The entry for `category` if it was fetched less than one TTL ago.
    pub fn fresh(&self, category: &str, now_ms: i64) -> Option<&CacheEntry> {
        self.entries
            .get(category)
            .filter(|entry| entry.age_ms(now_ms) < self.ttl_ms)
    }

    pub fn get(&self, category: &str) -> Option<&CacheEntry> {
        self.entries.get(category)
    }

    pub fn insert(&mut self, category: &str, articles: Arc<Vec<Article>>, now_ms: i64) {
        self.entries.insert(
            category.to_string(),
            CacheEntry {
                category: category.to_string(),
                fetched_at_ms: now_ms,
                articles,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
