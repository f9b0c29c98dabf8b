//! Per-producer reuse-distance histogram.
//!
//! Maps an observed distance (or its bucket key, see
//! [`ExactTracker`](crate::tracker::ExactTracker) bucketing) to the number of
//! times it was observed, and keeps running access and miss totals.
//!
//! Key 0 is the miss sentinel: the exact engine records evicted and cold
//! references there, which is why [`DistanceHistogram::miss_count`] sums the
//! explicit miss counter with the count stored at key 0.

use std::io::{self, Write};

use rustc_hash::FxHashMap;

use crate::error::InvariantError;

/// Counts of observed reuse distances for one producer id.
///
/// # Example
///
/// ```
/// use reusekit::stats::DistanceHistogram;
///
/// let mut hist = DistanceHistogram::new();
/// hist.update(3);
/// hist.update(3);
/// hist.update(17);
///
/// assert_eq!(hist.count_distance(3), 2);
/// assert_eq!(hist.access_count(), 3);
/// assert_eq!(hist.max_distance(), 17);
/// assert_eq!(hist.sorted_distances(), vec![3, 17]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DistanceHistogram {
    counts: FxHashMap<u64, u64>,
    accesses: u64,
    misses: u64,
}

impl DistanceHistogram {
    /// Creates an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for `distance` and the access total.
    ///
    /// Distance 0 is the miss sentinel; engines record out-of-window
    /// references by updating key 0.
    #[inline]
    pub fn update(&mut self, distance: u64) {
        *self.counts.entry(distance).or_insert(0) += 1;
        self.accesses += 1;
    }

    /// Increments the explicit miss counter and the access total.
    ///
    /// Equivalent to `update(0)` in meaning but tracked separately;
    /// [`miss_count`](Self::miss_count) reports both together.
    #[inline]
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.accesses += 1;
    }

    /// Returns how many times `distance` has been observed.
    #[inline]
    pub fn count_distance(&self, distance: u64) -> u64 {
        self.counts.get(&distance).copied().unwrap_or(0)
    }

    /// Returns how many observations fell within `low <= d < high`.
    pub fn count_range(&self, low: u64, high: u64) -> u64 {
        self.counts
            .iter()
            .filter(|(d, _)| **d >= low && **d < high)
            .map(|(_, count)| count)
            .sum()
    }

    /// Returns the observed distance keys in ascending order.
    pub fn sorted_distances(&self) -> Vec<u64> {
        let mut keys: Vec<u64> = self.counts.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Returns the largest distance key observed, or 0 if none.
    pub fn max_distance(&self) -> u64 {
        self.counts.keys().copied().max().unwrap_or(0)
    }

    /// Returns the total number of observations (updates plus misses).
    #[inline]
    pub fn access_count(&self) -> u64 {
        self.accesses
    }

    /// Returns the number of observations classified as misses: the explicit
    /// miss counter plus everything recorded at the key-0 sentinel.
    #[inline]
    pub fn miss_count(&self) -> u64 {
        self.misses + self.count_distance(0)
    }

    /// Writes one `\t<distance>\t<count>` line per nonzero key, ascending.
    ///
    /// Key 0 (the miss sentinel) is suppressed; misses are visible in the
    /// header emitted by the engines.
    pub fn write_plain<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for d in self.sorted_distances() {
            if d == 0 {
                continue;
            }
            writeln!(out, "\t{}\t{}", d, self.count_distance(d))?;
        }
        Ok(())
    }

    /// Writes one `\t<pretty>\t<distance>\t<count>` line per nonzero key,
    /// ascending.
    ///
    /// `pretty` is the human-facing lower bound for a bucketed key: the key
    /// itself when `bin_individual` is 0 (everything individual) or the key
    /// is at or below the threshold, otherwise `key / 2 + 1` (the smallest
    /// distance a power-of-two bucket can contain).
    pub fn write_binned<W: Write>(&self, out: &mut W, bin_individual: u64) -> io::Result<()> {
        for d in self.sorted_distances() {
            if d == 0 {
                continue;
            }
            let pretty = if bin_individual == 0 || d <= bin_individual {
                d
            } else {
                d / 2 + 1
            };
            writeln!(out, "\t{}\t{}\t{}", pretty, d, self.count_distance(d))?;
        }
        Ok(())
    }

    /// Verifies that the access total matches the recorded observations.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let counted: u64 = self.counts.values().sum();
        if self.accesses != counted + self.misses {
            return Err(InvariantError::new(format!(
                "access total {} != {} counted + {} missed",
                self.accesses, counted, self.misses
            )));
        }
        Ok(())
    }
}
