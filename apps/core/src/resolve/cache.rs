//! Time-bounded resolution cache.
//!
//! Keys are deliberately coarse, `(category, normalized title prefix)`, so that
//! near-duplicate tickets collapse onto one slot. Expired entries are never returned
//! and are evicted lazily on access.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::CacheSettings;
use crate::models::Category;

/// Cache slot identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub category: Category,
    pub title_prefix: String,
}

impl CacheKey {
    /// Builds a key from the first `prefix_chars` characters of the normalized title.
    ///
    /// Normalization lower-cases the title and collapses runs of whitespace.
    pub fn new(category: Category, title: &str, prefix_chars: usize) -> Self {
        let normalized = title
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self {
            category,
            title_prefix: normalized.chars().take(prefix_chars).collect(),
        }
    }
}

/// Longest lifetime an entry can get, whatever TTL is asked for.
const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

#[derive(Debug, Clone)]
struct CacheEntry {
    resolution: String,
    expires_at: Instant,
}

/// Thread-safe LRU cache with per-entry expiry. Concurrent writers to one key: last wins.
pub struct ResolutionCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
    prefix_chars: usize,
}

impl ResolutionCache {
    pub fn new(settings: &CacheSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: settings.ttl(),
            prefix_chars: settings.title_prefix_chars,
        }
    }

    /// Key for a ticket of `category` titled `title`.
    pub fn key(&self, category: Category, title: &str) -> CacheKey {
        CacheKey::new(category, title, self.prefix_chars)
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    /// Looks up `key` as of `now`; an entry expired at `now` is dropped and reported as a miss.
    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<String> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.resolution.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!("Evicting expired cache entry for {:?}", key);
            entries.pop(key);
        }
        None
    }

    /// Stores `resolution` under `key` for the configured TTL.
    pub fn put(&self, key: CacheKey, resolution: impl Into<String>) {
        self.put_at(key, resolution, self.ttl, Instant::now());
    }

    pub fn put_with_ttl(&self, key: CacheKey, resolution: impl Into<String>, ttl: Duration) {
        self.put_at(key, resolution, ttl, Instant::now());
    }

    pub fn put_at(
        &self,
        key: CacheKey,
        resolution: impl Into<String>,
        ttl: Duration,
        now: Instant,
    ) {
        let entry = CacheEntry {
            resolution: resolution.into(),
            expires_at: now + ttl.min(MAX_TTL),
        };
        self.lock().put(key, entry);
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry expired at `now`, returning how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let expired: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, CacheEntry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
