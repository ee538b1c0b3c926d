//! Render artifact cache
//!
//! Rendering artifacts are large and expensive to regenerate but only a
//! handful of versions are viewed at a time, so the cache is a small
//! bounded LRU keyed by version id:
//! - access promotes an entry to most-recently-used
//! - insertion past capacity evicts exactly the least-recently-used
//! - all state sits behind one mutex; concurrent readers are safe
//!
//! Concurrent misses for the same key may regenerate redundantly; the
//! cache deduplicates storage, not work.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::PageRendering;

/// Default number of cached versions.
pub const DEFAULT_RENDER_CACHE_CAPACITY: usize = 50;

/// Cached derived artifacts for one version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderArtifacts {
    /// Serialized first-page preview.
    pub preview: Option<String>,

    /// Decoded per-page renderings.
    pub pages: Option<Vec<PageRendering>>,
}

/// Cache counters. Passive: never influence caching decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries evicted to make room.
    pub evictions: u64,
}

#[derive(Debug)]
struct CacheEntry {
    artifacts: Arc<RenderArtifacts>,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Monotonic access counter; larger means more recent.
    tick: u64,
    stats: CacheStats,
}

/// Bounded LRU cache of render artifacts, keyed by version id.
#[derive(Debug)]
pub struct RenderCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl RenderCache {
    /// Creates a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RENDER_CACHE_CAPACITY)
    }

    /// Creates a cache bounded at `capacity` entries.
    ///
    /// A zero capacity caches nothing and every insert is a no-op.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// The configured capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Looks up a version's artifacts, promoting the entry on hit.
    pub fn get(&self, version_id: &str) -> Option<Arc<RenderArtifacts>> {
        let Ok(mut state) = self.state.lock() else {
            return None;
        };

        state.tick += 1;
        let tick = state.tick;
        match state.entries.get_mut(version_id) {
            Some(entry) => {
                entry.last_used = tick;
                let artifacts = Arc::clone(&entry.artifacts);
                state.stats.hits += 1;
                Some(artifacts)
            }
            None => {
                state.stats.misses += 1;
                None
            }
        }
    }

    /// Inserts (or replaces) a version's artifacts.
    ///
    /// When the cache is full and the key is new, the least-recently
    /// used entry is evicted first.
    pub fn insert(&self, version_id: impl Into<String>, artifacts: RenderArtifacts) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let version_id = version_id.into();

        if !state.entries.contains_key(&version_id) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                state.entries.remove(&key);
                state.stats.evictions += 1;
            }
        }

        state.tick += 1;
        let tick = state.tick;
        state.entries.insert(
            version_id,
            CacheEntry {
                artifacts: Arc::new(artifacts),
                last_used: tick,
            },
        );
    }

    /// Drops one version's entry, if present.
    pub fn invalidate(&self, version_id: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.remove(version_id);
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.entries.len()).unwrap_or(0)
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        self.state
            .lock()
            .map(|state| state.stats)
            .unwrap_or_default()
    }
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new()
    }
}
