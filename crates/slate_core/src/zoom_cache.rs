//! Zoom-indexed resource variant cache
//!
//! Images, paths, and patterns all materialize one native handle per display
//! zoom level on demand. This cache owns that zoom -> variant map and the
//! shared eviction/nearest-lookup behavior so each resource type does not
//! grow its own.

use rustc_hash::FxHashMap;

use crate::error::Result;

/// Map from zoom percentage to a materialized resource variant.
///
/// At most one variant exists per zoom level; materialization happens exactly
/// once per zoom until the entry is evicted.
#[derive(Debug)]
pub struct ZoomCache<T> {
    entries: FxHashMap<u32, T>,
}

impl<T> Default for ZoomCache<T> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<T> ZoomCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, zoom: u32) -> Option<&T> {
        self.entries.get(&zoom)
    }

    pub fn get_mut(&mut self, zoom: u32) -> Option<&mut T> {
        self.entries.get_mut(&zoom)
    }

    pub fn contains(&self, zoom: u32) -> bool {
        self.entries.contains_key(&zoom)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, zoom: u32, variant: T) -> Option<T> {
        self.entries.insert(zoom, variant)
    }

    pub fn remove(&mut self, zoom: u32) -> Option<T> {
        self.entries.remove(&zoom)
    }

    /// Returns the cached variant for `zoom`, materializing it with `f` on a
    /// miss. A failed materialization leaves the cache unchanged.
    pub fn get_or_try_insert(
        &mut self,
        zoom: u32,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<&mut T> {
        use std::collections::hash_map::Entry;
        match self.entries.entry(zoom) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(f()?)),
        }
    }

    /// Materialized zoom levels, in no particular order.
    /// Cached zoom levels, ascending.
    pub fn zooms(&self) -> Vec<u32> {
        let mut zooms: Vec<u32> = self.entries.keys().copied().collect();
        zooms.sort_unstable();
        zooms
    }

    /// Evicts every variant whose zoom is not in `keep`, running `on_evict`
    /// for each removed variant.
    pub fn retain_only(&mut self, keep: &[u32], mut on_evict: impl FnMut(T)) {
        let doomed: Vec<u32> = self
            .entries
            .keys()
            .copied()
            .filter(|z| !keep.contains(z))
            .collect();
        for zoom in doomed {
            if let Some(variant) = self.entries.remove(&zoom) {
                on_evict(variant);
            }
        }
    }

    /// Drains every variant, running `on_evict` for each.
    pub fn clear(&mut self, mut on_evict: impl FnMut(T)) {
        for (_, variant) in self.entries.drain() {
            on_evict(variant);
        }
    }

    /// The cached zoom closest to `target` by absolute percentage difference,
    /// preferring the next-higher zoom and falling back to the next-lower.
    pub fn nearest_zoom(&self, target: u32) -> Option<u32> {
        if self.entries.contains_key(&target) {
            return Some(target);
        }
        let higher = self
            .entries
            .keys()
            .copied()
            .filter(|&z| z > target)
            .min_by_key(|&z| z - target);
        let lower = self
            .entries
            .keys()
            .copied()
            .filter(|&z| z < target)
            .max_by_key(|&z| z);
        match (higher, lower) {
            (Some(h), Some(l)) => {
                // Ties go to the higher zoom; downscaling loses less detail.
                if h - target <= target - l {
                    Some(h)
                } else {
                    Some(l)
                }
            }
            (Some(h), None) => Some(h),
            (None, Some(l)) => Some(l),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphicsError;

    #[test]
    fn test_materializes_once_per_zoom() {
        let mut cache: ZoomCache<u64> = ZoomCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let v = *cache
                .get_or_try_insert(150, || {
                    calls += 1;
                    Ok(7)
                })
                .unwrap();
            assert_eq!(v, 7);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_materialization_leaves_cache_empty() {
        let mut cache: ZoomCache<u64> = ZoomCache::new();
        let err = cache
            .get_or_try_insert(200, || Err(GraphicsError::NoHandles))
            .unwrap_err();
        assert_eq!(err, GraphicsError::NoHandles);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_retain_only_evicts_the_rest() {
        let mut cache: ZoomCache<u64> = ZoomCache::new();
        cache.insert(100, 1);
        cache.insert(150, 2);
        cache.insert(200, 3);
        let mut evicted = Vec::new();
        cache.retain_only(&[150], |v| evicted.push(v));
        evicted.sort_unstable();
        assert_eq!(evicted, vec![1, 3]);
        assert_eq!(cache.zooms(), vec![150]);
    }

    #[test]
    fn test_nearest_zoom_prefers_next_higher() {
        let mut cache: ZoomCache<u64> = ZoomCache::new();
        cache.insert(100, 1);
        cache.insert(200, 2);
        // 150 is equidistant; higher wins
        assert_eq!(cache.nearest_zoom(150), Some(200));
        // exact hit wins outright
        assert_eq!(cache.nearest_zoom(100), Some(100));
        // closest by absolute difference
        assert_eq!(cache.nearest_zoom(120), Some(100));
        assert_eq!(cache.nearest_zoom(190), Some(200));
    }

    #[test]
    fn test_nearest_zoom_falls_back_to_lower() {
        let mut cache: ZoomCache<u64> = ZoomCache::new();
        cache.insert(100, 1);
        assert_eq!(cache.nearest_zoom(175), Some(100));
        let empty: ZoomCache<u64> = ZoomCache::new();
        assert_eq!(empty.nearest_zoom(100), None);
    }
}
