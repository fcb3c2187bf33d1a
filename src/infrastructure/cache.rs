//! Cache implementations
//!
//! - `MemoryCache`: bounded in-process cache (moka) with per-entry expiry and tags
//! - `NullCache`: always misses, stores nothing

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache as MokaCache;
use moka::Expiry;
use tracing::{debug, trace};

use crate::infrastructure::traits::Cache;

#[derive(Debug)]
struct CacheEntry {
    value: String,
    tags: Vec<String>,
    /// `None` keeps the entry until invalidated or evicted
    ttl: Option<Duration>,
}

/// Expires each entry after the TTL it was stored with.
struct EntryExpiry;

impl Expiry<String, Arc<CacheEntry>> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Arc<CacheEntry>,
        _created_at: Instant,
    ) -> Option<Duration> {
        entry.ttl
    }

    // Re-storing a key restarts its lifetime with the new TTL.
    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Arc<CacheEntry>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

/// In-process cache with tag invalidation.
#[derive(Clone)]
pub struct MemoryCache {
    entries: MokaCache<String, Arc<CacheEntry>>,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl MemoryCache {
    pub fn new(max_capacity: u64) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .support_invalidation_closures()
            .eviction_listener(|key, _value, cause| {
                trace!("cache evicted: {} (cause: {:?})", key, cause);
            })
            .build();
        Self { entries }
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
        tags: &[String],
    ) -> io::Result<()> {
        let entry = CacheEntry {
            value,
            tags: tags.to_vec(),
            ttl,
        };
        self.entries.insert(key.to_string(), Arc::new(entry));
        Ok(())
    }

    fn invalidate_tag(&self, tag: &str) -> io::Result<()> {
        let tag = tag.to_string();
        debug!(tag = %tag, "invalidating cache tag");
        self.entries
            .invalidate_entries_if(move |_key, entry| entry.tags.contains(&tag))
            .map(|_| ())
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl Cache for NullCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(
        &self,
        _key: &str,
        _value: String,
        _ttl: Option<Duration>,
        _tags: &[String],
    ) -> io::Result<()> {
        Ok(())
    }

    fn invalidate_tag(&self, _tag: &str) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn given_stored_value_when_getting_then_hits() {
        let cache = MemoryCache::new(16);
        cache.set("k", "v".into(), None, &[]).unwrap();
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn given_zero_ttl_when_getting_then_misses() {
        let cache = MemoryCache::new(16);
        cache
            .set("k", "v".into(), Some(Duration::ZERO), &[])
            .unwrap();
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn given_short_ttl_when_it_elapses_then_misses() {
        let cache = MemoryCache::new(16);
        cache
            .set("k", "v".into(), Some(Duration::from_millis(50)), &[])
            .unwrap();
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        std::thread::sleep(Duration::from_millis(120));

        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn given_expiring_entry_when_restored_without_ttl_then_keeps_it() {
        let cache = MemoryCache::new(16);
        cache
            .set("k", "old".into(), Some(Duration::from_millis(50)), &[])
            .unwrap();
        cache.set("k", "new".into(), None, &[]).unwrap();

        std::thread::sleep(Duration::from_millis(120));

        assert_eq!(cache.get("k").as_deref(), Some("new"));
    }

    #[test]
    fn given_tagged_entries_when_invalidating_tag_then_only_those_miss() {
        let cache = MemoryCache::new(16);
        cache.set("a", "1".into(), None, &tags(&["category"])).unwrap();
        cache.set("b", "2".into(), None, &tags(&["product"])).unwrap();

        cache.invalidate_tag("category").unwrap();

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn given_null_cache_when_setting_then_never_hits() {
        let cache = NullCache;
        cache.set("k", "v".into(), None, &[]).unwrap();
        assert_eq!(cache.get("k"), None);
    }
}
