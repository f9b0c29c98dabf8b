//! Exact reuse-distance engine.
//!
//! Per reference, reports the number of *distinct* addresses touched since
//! the previous access to the same address (the classical LRU stack
//! distance). Two mirrored structures make that O(log n):
//!
//! - an address index (`FxHashMap<address, seq>`) finds the previous access
//!   in O(1);
//! - a [`RankTree`] keyed by access sequence counts the distinct addresses
//!   touched since then via one rank query.
//!
//! Neither alone is sufficient: the map cannot count, the tree cannot find a
//! key by address.
//!
//! ## Per-reference flow
//!
//! ```text
//!   process(id, addr)
//!     ├─ hit:  rank = tree.rank_of(index[addr])
//!     │        distance = resident - rank          (distinct newer addrs)
//!     │        histogram[bin(distance)] += 1
//!     │        recycle the old slot at `rank`
//!     ├─ miss: histogram[0] += 1
//!     │        window full → evict rank 0 (oldest), else resident += 1
//!     └─ append (sequence, addr) at the rightmost tree position
//! ```
//!
//! Distances above the `bin_individual` threshold are coarsened to
//! power-of-two buckets so long-tail histograms stay small.

use std::io::{self, Write};

use rustc_hash::FxHashMap;

use crate::ds::{RankTree, RecencyEntry};
use crate::error::InvariantError;
#[cfg(feature = "metrics")]
use crate::metrics::{TrackerMetrics, TrackerMetricsSnapshot};
use crate::stats::{DistanceHistogram, StatsRegistry};
use crate::tracker::{Access, UNLIMITED};

/// Default bucketing threshold: distances up to 32 are tracked individually,
/// larger ones land in power-of-two buckets.
pub const DEFAULT_BIN_INDIVIDUAL: u64 = 32;

const SYNC_MSG: &str = "address index refers to a sequence missing from the recency tree";

/// Exact LRU stack-distance engine.
///
/// # Example
///
/// ```
/// use reusekit::tracker::{Access, ExactTracker, UNLIMITED};
///
/// let mut tracker = ExactTracker::new(UNLIMITED);
/// for addr in [0u64, 1, 2, 0] {
///     tracker.process(Access::new(0, addr));
/// }
///
/// // Three distinct addresses were touched between the two accesses to 0.
/// let hist = tracker.stats(0).unwrap();
/// assert_eq!(hist.count_distance(3), 1);
/// assert_eq!(hist.miss_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ExactTracker {
    /// Recency entries ordered by access sequence.
    tree: RankTree,
    /// address -> seq of that address's live tree entry.
    index: FxHashMap<u64, u64>,
    stats: StatsRegistry,
    sequence: u64,
    capacity: u64,
    bin_individual: u64,
    /// Mirror of `tree.len()`, kept as the window occupancy count.
    resident: u64,
    #[cfg(feature = "metrics")]
    metrics: TrackerMetrics,
}

impl ExactTracker {
    /// Creates a tracker with the given window capacity and the default
    /// bucketing threshold.
    ///
    /// `capacity` 0 ([`UNLIMITED`](crate::tracker::UNLIMITED)) means no
    /// window: memory grows with the number of distinct addresses.
    pub fn new(capacity: u64) -> Self {
        Self::with_bin_individual(capacity, DEFAULT_BIN_INDIVIDUAL)
    }

    /// Creates a tracker with explicit window capacity and bucketing
    /// threshold.
    ///
    /// `bin_individual` 0 keeps every distance individual; otherwise
    /// distances at or below the threshold stay individual and larger ones
    /// are coarsened to the smallest power of two at or above them.
    pub fn with_bin_individual(capacity: u64, bin_individual: u64) -> Self {
        Self {
            tree: RankTree::new(),
            index: FxHashMap::default(),
            stats: StatsRegistry::new(),
            sequence: 1,
            capacity,
            bin_individual,
            resident: 0,
            #[cfg(feature = "metrics")]
            metrics: TrackerMetrics::default(),
        }
    }

    /// Returns the window capacity (0 = unlimited).
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns the bucketing threshold (0 = all distances individual).
    #[inline]
    pub fn bin_individual(&self) -> u64 {
        self.bin_individual
    }

    /// Returns the sequence number the next reference will receive.
    #[inline]
    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the number of addresses currently resident in the window.
    #[inline]
    pub fn resident_count(&self) -> u64 {
        self.resident
    }

    /// Processes one reference: records its distance (or a miss) in the
    /// producer's histogram and makes `access.address` the most recent
    /// resident.
    pub fn process(&mut self, access: Access) {
        #[cfg(feature = "metrics")]
        self.metrics.record_process();

        let prev = self.index.get(&access.address).copied();
        let hit_rank = prev.map(|seq| self.tree.rank_of(seq).expect(SYNC_MSG));

        let observed = match hit_rank {
            // `resident - rank` counts the entries more recent than the
            // previous access, the just-accessed address included.
            Some(rank) => self.bin_for(self.resident - rank as u64),
            None => 0,
        };
        self.stats.get_or_create(access.id).update(observed);

        match hit_rank {
            Some(rank) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_hit();

                // Recycle the slot of the previous access; occupancy is
                // unchanged.
                self.tree.remove_at(rank);
                self.index.remove(&access.address);
            },
            None => {
                #[cfg(feature = "metrics")]
                self.metrics.record_miss();

                if self.capacity != UNLIMITED && self.resident >= self.capacity {
                    if let Some(evicted) = self.tree.remove_at(0) {
                        self.index.remove(&evicted.address);
                        #[cfg(feature = "metrics")]
                        self.metrics.record_eviction();
                    }
                } else {
                    self.resident += 1;
                }
            },
        }

        self.tree
            .insert(RecencyEntry::new(self.sequence, access.address));
        self.index.insert(access.address, self.sequence);
        self.sequence += 1;
    }

    /// Processes a batch of references in order.
    pub fn process_many(&mut self, accesses: &[Access]) {
        for &access in accesses {
            self.process(access);
        }
    }

    /// Returns the distance `process(access)` would record, without mutating
    /// any state. A miss yields 0.
    ///
    /// The returned value is the raw distance, before bucketing.
    pub fn distance(&self, access: Access) -> u64 {
        match self.index.get(&access.address) {
            Some(&seq) => {
                let rank = self.tree.rank_of(seq).expect(SYNC_MSG);
                self.resident - rank as u64
            },
            None => 0,
        }
    }

    /// Returns the histogram for `id`, if that id has been processed.
    #[inline]
    pub fn stats(&self, id: u64) -> Option<&DistanceHistogram> {
        self.stats.get(id)
    }

    /// Returns every producer id seen so far, in unspecified order.
    pub fn indices(&self) -> Vec<u64> {
        self.stats.ids()
    }

    /// Returns the resident addresses in recency order, oldest first.
    pub fn active_addresses(&self) -> Vec<u64> {
        self.tree.iter().map(|entry| entry.address).collect()
    }

    /// Writes all histograms to `out`, ids ascending.
    ///
    /// Per id: a `REUSESTATS\t<id>\t<capacity>\t<accesses>\t<misses>` header
    /// followed by one `\t<pretty>\t<distance>\t<count>` line per nonzero
    /// distance key.
    pub fn write_stats<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for id in self.stats.sorted_ids() {
            if let Some(hist) = self.stats.get(id) {
                writeln!(
                    out,
                    "REUSESTATS\t{}\t{}\t{}\t{}",
                    id,
                    self.capacity,
                    hist.access_count(),
                    hist.miss_count()
                )?;
                hist.write_binned(out, self.bin_individual)?;
            }
        }
        Ok(())
    }

    /// Writes all histograms to stdout.
    pub fn print(&self) -> io::Result<()> {
        self.write_stats(&mut io::stdout().lock())
    }

    /// Verifies the coherence of the tree, the address index, and the
    /// occupancy count.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.tree.check_invariants()?;

        if self.tree.len() as u64 != self.resident {
            return Err(InvariantError::new(format!(
                "occupancy count {} != tree size {}",
                self.resident,
                self.tree.len()
            )));
        }
        if self.index.len() != self.tree.len() {
            return Err(InvariantError::new(format!(
                "address index holds {} entries, tree holds {}",
                self.index.len(),
                self.tree.len()
            )));
        }
        if self.capacity != UNLIMITED && self.resident > self.capacity {
            return Err(InvariantError::new(format!(
                "{} resident addresses exceed capacity {}",
                self.resident, self.capacity
            )));
        }
        for (&address, &seq) in &self.index {
            let rank = self.index_rank(address, seq)?;
            let entry = self.tree.get(rank).ok_or_else(|| {
                InvariantError::new(format!("rank {rank} vanished during check"))
            })?;
            if entry.address != address || entry.seq != seq {
                return Err(InvariantError::new(format!(
                    "index row ({address}, {seq}) maps to tree entry ({}, {})",
                    entry.address, entry.seq
                )));
            }
        }
        for (_, hist) in self.stats.iter() {
            hist.check_invariants()?;
        }
        Ok(())
    }

    fn index_rank(&self, address: u64, seq: u64) -> Result<usize, InvariantError> {
        self.tree.rank_of(seq).ok_or_else(|| {
            InvariantError::new(format!(
                "index row ({address}, {seq}) has no tree entry"
            ))
        })
    }

    /// Maps a raw distance to its histogram key: identity at or below the
    /// threshold, otherwise the smallest power of two at or above it.
    #[inline]
    fn bin_for(&self, distance: u64) -> u64 {
        if self.bin_individual != UNLIMITED && distance > self.bin_individual {
            distance.next_power_of_two()
        } else {
            distance
        }
    }

    /// Returns a snapshot of this engine's operation counters.
    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> TrackerMetricsSnapshot {
        TrackerMetricsSnapshot {
            process_calls: self.metrics.process_calls,
            hits: self.metrics.hits,
            misses: self.metrics.misses,
            evictions: self.metrics.evictions,
            cleanup_runs: self.metrics.cleanup_runs,
            cleanup_reclaimed: self.metrics.cleanup_reclaimed,
            resident: self.resident,
            tracked_ids: self.stats.len(),
        }
    }
}

impl Extend<Access> for ExactTracker {
    fn extend<T: IntoIterator<Item = Access>>(&mut self, iter: T) {
        for access in iter {
            self.process(access);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(tracker: &mut ExactTracker, addresses: &[u64]) {
        for &address in addresses {
            tracker.process(Access::new(0, address));
            tracker.check_invariants().unwrap();
        }
    }

    #[test]
    fn cold_stream_is_all_misses() {
        let mut tracker = ExactTracker::new(UNLIMITED);
        stream(&mut tracker, &[10, 20, 30, 40]);

        let hist = tracker.stats(0).unwrap();
        assert_eq!(hist.access_count(), 4);
        assert_eq!(hist.miss_count(), 4);
        assert_eq!(hist.sorted_distances(), vec![0]);
    }

    #[test]
    fn immediate_repeat_has_distance_one() {
        let mut tracker = ExactTracker::new(UNLIMITED);
        stream(&mut tracker, &[7, 7]);

        let hist = tracker.stats(0).unwrap();
        assert_eq!(hist.count_distance(1), 1);
        assert_eq!(hist.miss_count(), 1);
        assert_eq!(hist.access_count(), 2);
    }

    #[test]
    fn distance_counts_distinct_intervening_addresses() {
        let mut tracker = ExactTracker::new(UNLIMITED);
        // 1 and 2 are each touched twice between the accesses to 0; only
        // distinct addresses count.
        stream(&mut tracker, &[0, 1, 2, 1, 2, 0]);

        let hist = tracker.stats(0).unwrap();
        assert_eq!(hist.count_distance(3), 1);
        assert_eq!(hist.miss_count(), 3);
    }

    #[test]
    fn repeats_recycle_occupancy() {
        let mut tracker = ExactTracker::new(UNLIMITED);
        stream(&mut tracker, &[1, 2, 1, 2, 1, 2]);
        assert_eq!(tracker.resident_count(), 2);
        assert_eq!(tracker.active_addresses(), vec![1, 2]);
    }

    #[test]
    fn window_eviction_drops_oldest() {
        let mut tracker = ExactTracker::new(2);
        stream(&mut tracker, &[1, 2, 3]);

        // 1 was evicted to admit 3.
        assert_eq!(tracker.active_addresses(), vec![2, 3]);
        assert_eq!(tracker.resident_count(), 2);

        // Re-touching 1 is therefore a miss.
        tracker.process(Access::new(0, 1));
        assert_eq!(tracker.stats(0).unwrap().miss_count(), 4);
    }

    #[test]
    fn bucketing_boundary_is_inclusive() {
        // Distance 4 == threshold: individual.
        let mut at_threshold = ExactTracker::with_bin_individual(UNLIMITED, 4);
        stream(&mut at_threshold, &[0, 1, 2, 3, 0]);
        let hist = at_threshold.stats(0).unwrap();
        assert_eq!(hist.count_distance(4), 1);

        // Distance 5 > threshold: bucketed to 8.
        let mut above = ExactTracker::with_bin_individual(UNLIMITED, 4);
        stream(&mut above, &[0, 1, 2, 3, 4, 0]);
        let hist = above.stats(0).unwrap();
        assert_eq!(hist.count_distance(5), 0);
        assert_eq!(hist.count_distance(8), 1);
    }

    #[test]
    fn power_of_two_distance_is_its_own_bucket() {
        let mut tracker = ExactTracker::with_bin_individual(UNLIMITED, 2);
        // Raw distance 4, above the threshold; smallest power of two >= 4
        // is 4 itself.
        stream(&mut tracker, &[0, 1, 2, 3, 0]);

        let hist = tracker.stats(0).unwrap();
        assert_eq!(hist.count_distance(4), 1);
        assert_eq!(hist.count_distance(8), 0);
    }

    #[test]
    fn distance_query_matches_process_and_does_not_mutate() {
        let mut tracker = ExactTracker::new(UNLIMITED);
        stream(&mut tracker, &[5, 6, 7]);

        let probe = Access::new(0, 5);
        let before = tracker.current_sequence();
        assert_eq!(tracker.distance(probe), 3);
        assert_eq!(tracker.current_sequence(), before);
        assert_eq!(tracker.distance(Access::new(0, 99)), 0);

        tracker.process(probe);
        assert_eq!(tracker.stats(0).unwrap().count_distance(3), 1);
    }

    #[test]
    fn ids_update_independent_histograms() {
        let mut tracker = ExactTracker::new(UNLIMITED);
        tracker.process(Access::new(1, 100));
        tracker.process(Access::new(2, 100));
        tracker.process(Access::new(1, 100));

        // The window is shared across ids; only the histograms are per-id.
        assert_eq!(tracker.stats(1).unwrap().access_count(), 2);
        assert_eq!(tracker.stats(2).unwrap().access_count(), 1);
        assert_eq!(tracker.stats(1).unwrap().count_distance(1), 1);
        assert_eq!(tracker.stats(2).unwrap().count_distance(1), 1);

        let mut ids = tracker.indices();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn active_addresses_in_recency_order() {
        let mut tracker = ExactTracker::new(UNLIMITED);
        stream(&mut tracker, &[3, 1, 2, 1]);
        assert_eq!(tracker.active_addresses(), vec![3, 2, 1]);
    }

    #[test]
    fn extend_processes_in_order() {
        let mut tracker = ExactTracker::new(UNLIMITED);
        tracker.extend([0u64, 1, 0].into_iter().map(|a| Access::new(0, a)));

        let hist = tracker.stats(0).unwrap();
        assert_eq!(hist.access_count(), 3);
        assert_eq!(hist.count_distance(2), 1);
    }

    #[test]
    fn write_stats_sorts_ids_and_formats_header() {
        let mut tracker = ExactTracker::new(UNLIMITED);
        tracker.process(Access::new(9, 1));
        tracker.process(Access::new(4, 1));
        tracker.process(Access::new(4, 1));

        let mut out = Vec::new();
        tracker.write_stats(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "REUSESTATS\t4\t0\t2\t1\n\t1\t1\t1\nREUSESTATS\t9\t0\t1\t1\n"
        );
    }

    #[test]
    fn clone_is_independent() {
        let mut tracker = ExactTracker::new(3);
        stream(&mut tracker, &[1, 2]);

        let mut copy = tracker.clone();
        copy.process(Access::new(0, 3));

        assert_eq!(tracker.resident_count(), 2);
        assert_eq!(copy.resident_count(), 3);
        assert_eq!(copy.distance(Access::new(0, 1)), 3);
        assert_eq!(tracker.distance(Access::new(0, 1)), 2);
        copy.check_invariants().unwrap();
        tracker.check_invariants().unwrap();
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn metrics_count_hits_misses_evictions() {
        let mut tracker = ExactTracker::new(2);
        stream(&mut tracker, &[1, 2, 1, 3, 4]);

        let snap = tracker.metrics_snapshot();
        assert_eq!(snap.process_calls, 5);
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.misses, 4);
        // 3 and 4 each arrived with the window full.
        assert_eq!(snap.evictions, 2);
        assert_eq!(snap.resident, 2);
        assert_eq!(snap.tracked_ids, 1);
    }
}
