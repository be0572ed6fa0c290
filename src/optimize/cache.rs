// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Result cache
//!
//! LRU with an adaptive TTL.  The effective TTL grows with query
//! complexity, shrinks for write-flavored queries, gets a boost for tiny
//! results, and is hard-capped at five times the configured base.

use crate::model::report::CacheStats;
use crate::types::RowVec;
use derive_builder::Builder;
use getset::Getters;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Hard ceiling: effective TTL never exceeds this multiple of the base
const TTL_CAP_FACTOR: f64 = 5.0;
/// Results smaller than this many bytes keep their entry longer
const SMALL_RESULT_BYTES: usize = 1_000;
const SMALL_RESULT_BOOST: f64 = 1.5;
/// CREATE/MERGE queries age out twice as fast
const WRITE_PENALTY: f64 = 0.5;
/// Hot entries (more than this many hits) earn a TTL extension
const EXTEND_AFTER_HITS: u64 = 5;
const EXTEND_FACTOR: f64 = 0.2;

const CAPACITY_ZERO_ERR: &str = "capacity cannot be 0!";

/// Result cache tuning knobs
#[derive(Builder, Clone, Debug, Getters)]
#[getset(get = "pub(crate)")]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Config {
    /// Maximum number of cached result sets
    #[builder(default = "1_000")]
    capacity: usize,
    /// Base TTL fed into the adaptive formula
    #[builder(default = "Duration::from_secs(300)")]
    base_ttl: Duration,
    /// How often the background sweeper drops expired entries
    #[builder(default = "Duration::from_secs(60)")]
    sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1_000,
            base_ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl ConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(0) = self.capacity {
            return Err(CAPACITY_ZERO_ERR.into());
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct Entry {
    rows: RowVec,
    inserted: Instant,
    ttl: Duration,
    access_count: u64,
    bytes: usize,
}

impl Entry {
    fn expired(&self) -> bool {
        self.inserted.elapsed() > self.ttl
    }
}

/// The memoized rows of previously executed read queries, keyed by
/// query signature
pub struct ResultCache {
    config: Config,
    entries: Mutex<LruCache<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ResultCache {
    ///
    #[must_use]
    pub fn new(config: Config) -> Self {
        let capacity =
            NonZeroUsize::new(*config.capacity()).unwrap_or_else(|| NonZeroUsize::new(1).expect("1 is non-zero"));
        Self {
            config,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// The adaptive TTL for a fresh entry:
    /// `base × (1 + min(complexity / 10, 3))`, ×1.5 for small results,
    /// ×0.5 for write-flavored queries, capped at 5 × base
    #[must_use]
    pub fn effective_ttl(&self, complexity: u32, bytes: usize, write_flavored: bool) -> Duration {
        let base = *self.config.base_ttl();
        let mut factor = 1.0 + (f64::from(complexity) / 10.0).min(3.0);
        if bytes < SMALL_RESULT_BYTES {
            factor *= SMALL_RESULT_BOOST;
        }
        if write_flavored {
            factor *= WRITE_PENALTY;
        }
        let capped = factor.min(TTL_CAP_FACTOR);
        base.mul_f64(capped)
    }

    /// Look a signature up.  Bumps recency and the access count; hot
    /// entries get their remaining TTL extended by 20%, still capped at
    /// five times the base.
    #[must_use]
    pub fn get(&self, sig: &str) -> Option<RowVec> {
        let mut entries = self.entries.lock();
        match entries.get_mut(sig) {
            Some(entry) if entry.expired() => {
                let _ = entries.pop(sig);
                let _ = self.expirations.fetch_add(1, Ordering::Relaxed);
                let _ = self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) => {
                entry.access_count += 1;
                if entry.access_count > EXTEND_AFTER_HITS {
                    let elapsed = entry.inserted.elapsed();
                    let remaining = entry.ttl.saturating_sub(elapsed);
                    let extended = elapsed + remaining.mul_f64(1.0 + EXTEND_FACTOR);
                    let cap = self.config.base_ttl().mul_f64(TTL_CAP_FACTOR);
                    entry.ttl = extended.min(cap);
                }
                let _ = self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.rows.clone())
            }
            None => {
                let _ = self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert rows under a signature, evicting the least recently used
    /// entry when the cache is at capacity
    pub fn put(&self, sig: &str, rows: RowVec, ttl: Duration) {
        let bytes = crate::utils::byte_estimate(&rows);
        let entry = Entry {
            rows,
            inserted: Instant::now(),
            ttl,
            access_count: 0,
            bytes,
        };
        let mut entries = self.entries.lock();
        if entries.len() == *self.config.capacity() && !entries.contains(sig) {
            let _ = self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        let _ = entries.put(sig.to_string(), entry);
    }

    /// Drop every entry whose key contains the given fragment
    pub fn invalidate(&self, fragment: &str) -> usize {
        let mut entries = self.entries.lock();
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.contains(fragment))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            let _ = entries.pop(key);
        }
        debug!(count = doomed.len(), "invalidated result-cache entries");
        doomed.len()
    }

    /// Drop everything
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Remove expired entries; called by the background sweeper
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.lock();
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            let _ = entries.pop(key);
            let _ = self.expirations.fetch_add(1, Ordering::Relaxed);
        }
        doomed.len()
    }

    ///
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    ///
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    ///
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats::new(
            self.len(),
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.evictions.load(Ordering::Relaxed),
            self.expirations.load(Ordering::Relaxed),
        )
    }

    /// Total estimated bytes held, for observability
    #[must_use]
    pub fn byte_footprint(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .map(|(_, entry)| entry.bytes)
            .sum()
    }

    pub(crate) fn sweep_interval(&self) -> Duration {
        *self.config.sweep_interval()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod test {
    use super::{Config, ConfigBuilder, ResultCache, TTL_CAP_FACTOR};
    use anyhow::Result;
    use serde_json::json;
    use std::time::Duration;

    fn row(val: u64) -> crate::types::Row {
        let mut row = crate::types::Row::new();
        let _ = row.insert("n".to_string(), json!(val));
        row
    }

    fn small_cache(capacity: usize) -> Result<ResultCache> {
        Ok(ResultCache::new(
            ConfigBuilder::default().capacity(capacity).build()?,
        ))
    }

    #[test]
    fn hit_after_put() -> Result<()> {
        let cache = small_cache(4)?;
        cache.put("sig-a", vec![row(1)], Duration::from_secs(60));
        assert_eq!(cache.get("sig-a").map(|rows| rows.len()), Some(1));
        assert_eq!(*cache.stats().hits(), 1);
        Ok(())
    }

    #[test]
    fn expired_entry_misses() -> Result<()> {
        let cache = small_cache(4)?;
        cache.put("sig-a", vec![row(1)], Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("sig-a").is_none());
        assert_eq!(*cache.stats().expirations(), 1);
        Ok(())
    }

    #[test]
    fn eviction_at_exact_capacity() -> Result<()> {
        let cache = small_cache(2)?;
        cache.put("sig-a", vec![row(1)], Duration::from_secs(60));
        cache.put("sig-b", vec![row(2)], Duration::from_secs(60));
        assert_eq!(cache.len(), 2);
        // touch a so b is the least recently used
        let _ = cache.get("sig-a");
        cache.put("sig-c", vec![row(3)], Duration::from_secs(60));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("sig-b").is_none());
        assert!(cache.get("sig-a").is_some());
        assert_eq!(*cache.stats().evictions(), 1);
        Ok(())
    }

    #[test]
    fn effective_ttl_never_exceeds_cap() {
        let cache = ResultCache::new(Config::default());
        let base = Duration::from_secs(300);
        // worst case: max complexity bonus and the small-result boost
        let ttl = cache.effective_ttl(1_000, 10, false);
        assert!(ttl <= base.mul_f64(TTL_CAP_FACTOR));
        // (1 + 3) * 1.5 = 6 would bust the cap without clamping
        assert_eq!(ttl, base.mul_f64(TTL_CAP_FACTOR));
    }

    #[test]
    fn write_flavored_queries_age_faster() {
        let cache = ResultCache::new(Config::default());
        let read = cache.effective_ttl(5, 5_000, false);
        let write = cache.effective_ttl(5, 5_000, true);
        assert_eq!(write, read.mul_f64(0.5));
    }

    #[test]
    fn hot_entries_get_extended() -> Result<()> {
        let cache = small_cache(4)?;
        cache.put("sig-a", vec![row(1)], Duration::from_secs(10));
        for _ in 0..6 {
            let _ = cache.get("sig-a");
        }
        // after the sixth hit the remaining TTL grew by 20%
        let entries = cache.entries.lock();
        let entry = entries.peek("sig-a").expect("entry present");
        assert!(entry.ttl > Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn invalidate_by_fragment() -> Result<()> {
        let cache = small_cache(8)?;
        cache.put("query:codeentity:1", vec![row(1)], Duration::from_secs(60));
        cache.put("query:codeentity:2", vec![row(2)], Duration::from_secs(60));
        cache.put("query:pattern:1", vec![row(3)], Duration::from_secs(60));
        assert_eq!(cache.invalidate("codeentity"), 2);
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn sweep_removes_expired_only() -> Result<()> {
        let cache = small_cache(8)?;
        cache.put("stale", vec![row(1)], Duration::from_millis(0));
        cache.put("fresh", vec![row(2)], Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("fresh").is_some());
        Ok(())
    }
}
