//! The process-wide store of decoded elevation grids.
//!
//! Entries are keyed by `TileKey` and never change after they are published, except by `clear` or by LRU eviction when the
//! cache is bounded. An entry whose `heights` is `None` records a tile that is known to have no elevation data, so the
//! provider does not ask the network for it again.

use crate::{lru::SmallKeyLruCache, SharedGrid};

use terrain_tiles_core::{Extent, TileKey};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// What is known about one tile.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    pub heights: Option<SharedGrid>,
    pub extent: Extent,
}

impl CacheEntry {
    #[inline]
    pub fn new(heights: Option<SharedGrid>, extent: Extent) -> Self {
        Self { heights, extent }
    }

    /// An entry for a tile that has no elevation data.
    #[inline]
    pub fn missing(extent: Extent) -> Self {
        Self::new(None, extent)
    }

    #[inline]
    pub fn has_heights(&self) -> bool {
        self.heights.is_some()
    }
}

/// Hit and miss counters, mostly useful for tests and diagnostics.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Thread-safe, optionally bounded map from `TileKey` to `CacheEntry`.
///
/// Every operation takes the internal lock once, so a batch written by `publish` becomes visible all at once.
#[derive(Debug, Default)]
pub struct ElevationCache {
    state: Mutex<CacheState>,
    max_entries: Option<usize>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: SmallKeyLruCache<TileKey, CacheEntry>,
    stats: CacheStats,
}

impl ElevationCache {
    /// A cache that never evicts.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `max_entries` tiles; the least recently used tiles are evicted first.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            state: Default::default(),
            max_entries: Some(max_entries.max(1)),
        }
    }

    #[inline]
    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // A panic while holding the lock cannot leave a half-written entry behind, so poisoning is ignored.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the entry for `key` and marks it as recently used.
    pub fn get(&self, key: &TileKey) -> Option<CacheEntry> {
        let mut state = self.lock();
        if state.entries.touch(key) {
            state.stats.hits += 1;
            state.entries.get(key).cloned()
        } else {
            state.stats.misses += 1;
            None
        }
    }

    /// Like `get`, but neither counts the access nor updates recency.
    pub fn peek(&self, key: &TileKey) -> Option<CacheEntry> {
        self.lock().entries.get(key).cloned()
    }

    #[inline]
    pub fn contains(&self, key: &TileKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn set(&self, key: TileKey, entry: CacheEntry) {
        self.publish(std::iter::once((key, entry)));
    }

    /// Writes all `entries` under a single lock. Readers observe either none or all of them.
    pub fn publish(&self, entries: impl IntoIterator<Item = (TileKey, CacheEntry)>) {
        let mut state = self.lock();
        for (key, entry) in entries {
            state.entries.insert(key, entry);
        }
        if let Some(max) = self.max_entries {
            while state.entries.len() > max {
                if let Some((evicted, _)) = state.entries.pop_lru() {
                    tracing::trace!(tile = %evicted, "evicted elevation tile");
                    state.stats.evictions += 1;
                } else {
                    break;
                }
            }
        }
    }

    /// The deepest strict ancestor of `key` whose entry has heights.
    pub fn nearest_ancestor_with_heights(&self, key: &TileKey) -> Option<(TileKey, SharedGrid)> {
        let state = self.lock();
        key.ancestors().find_map(|ancestor| {
            state
                .entries
                .get(&ancestor)
                .and_then(|entry| entry.heights.clone())
                .map(|grid| (ancestor, grid))
        })
    }

    pub fn remove(&self, key: &TileKey) -> Option<CacheEntry> {
        self.lock().entries.remove(key)
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        tracing::debug!("cleared elevation cache");
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
