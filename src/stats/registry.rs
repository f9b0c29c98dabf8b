//! Per-engine registry of producer histograms.
//!
//! Each engine owns one registry mapping producer `id` to its
//! [`DistanceHistogram`], created lazily on the first reference carrying that
//! id. Enumeration order is unspecified; printing paths use
//! [`StatsRegistry::sorted_ids`] so output is deterministic across runs.

use rustc_hash::FxHashMap;

use crate::stats::histogram::DistanceHistogram;

/// Map from producer id to its histogram.
#[derive(Debug, Clone, Default)]
pub struct StatsRegistry {
    by_id: FxHashMap<u64, DistanceHistogram>,
}

impl StatsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the histogram for `id`, if that id has been observed.
    #[inline]
    pub fn get(&self, id: u64) -> Option<&DistanceHistogram> {
        self.by_id.get(&id)
    }

    /// Returns the histogram for `id`, creating an empty one if absent.
    #[inline]
    pub fn get_or_create(&mut self, id: u64) -> &mut DistanceHistogram {
        self.by_id.entry(id).or_default()
    }

    /// Returns all observed ids, in unspecified order.
    pub fn ids(&self) -> Vec<u64> {
        self.by_id.keys().copied().collect()
    }

    /// Returns all observed ids in ascending order.
    pub fn sorted_ids(&self) -> Vec<u64> {
        let mut ids = self.ids();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of tracked ids.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if no id has been observed yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterates `(id, histogram)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &DistanceHistogram)> {
        self.by_id.iter().map(|(id, hist)| (*id, hist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_lazy() {
        let mut registry = StatsRegistry::new();
        assert!(registry.get(7).is_none());
        assert!(registry.is_empty());

        registry.get_or_create(7).update(3);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(7).map(|h| h.count_distance(3)), Some(1));
    }

    #[test]
    fn get_or_create_reuses_existing() {
        let mut registry = StatsRegistry::new();
        registry.get_or_create(1).update(2);
        registry.get_or_create(1).update(2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(1).map(|h| h.access_count()), Some(2));
    }

    #[test]
    fn sorted_ids_ascend() {
        let mut registry = StatsRegistry::new();
        for id in [9u64, 2, 500, 0] {
            registry.get_or_create(id);
        }
        assert_eq!(registry.sorted_ids(), vec![0, 2, 9, 500]);

        let mut unsorted = registry.ids();
        unsorted.sort_unstable();
        assert_eq!(unsorted, registry.sorted_ids());
    }

    #[test]
    fn clone_is_deep() {
        let mut registry = StatsRegistry::new();
        registry.get_or_create(4).update(1);

        let mut copy = registry.clone();
        copy.get_or_create(4).update(1);
        copy.get_or_create(5);

        assert_eq!(registry.get(4).map(|h| h.access_count()), Some(1));
        assert!(registry.get(5).is_none());
        assert_eq!(copy.get(4).map(|h| h.access_count()), Some(2));
    }
}
