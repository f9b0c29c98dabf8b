//! Approximate windowed reuse-distance engine.
//!
//! Trades the exact distinct-address count for a single hash lookup: the
//! reported distance is the raw sequence gap `sequence - last_seen(addr)`,
//! which over-counts whenever intervening references repeat addresses. In
//! exchange, processing is O(1) amortized.
//!
//! A reference whose previous access lies `capacity` or more ticks in the
//! past is recorded as a miss (key 0), so the range check alone enforces the
//! window. Entries older than the window are physically reclaimed by a paced
//! bulk [`cleanup`](ApproxTracker::cleanup); that pass is purely a memory
//! optimization and never affects reported distances.

use std::io::{self, Write};

use rustc_hash::FxHashMap;

use crate::error::InvariantError;
#[cfg(feature = "metrics")]
use crate::metrics::{TrackerMetrics, TrackerMetricsSnapshot};
use crate::stats::{DistanceHistogram, StatsRegistry};
use crate::tracker::{Access, UNLIMITED};

/// Floor for the cleanup pacing interval. The engine cleans at most once per
/// `max(capacity, MIN_CLEAN_FREQUENCY)` processed references.
pub const MIN_CLEAN_FREQUENCY: u64 = 1_000_000;

/// Approximate sequence-gap engine.
///
/// # Example
///
/// ```
/// use reusekit::tracker::{Access, ApproxTracker};
///
/// let mut tracker = ApproxTracker::new(10);
/// for addr in [0u64, 1, 0] {
///     tracker.process(Access::new(0, addr));
/// }
///
/// // The second access to 0 comes two sequence ticks after the first.
/// let hist = tracker.stats(0).unwrap();
/// assert_eq!(hist.count_distance(2), 1);
/// assert_eq!(hist.miss_count(), 2);
/// ```
#[derive(Debug)]
pub struct ApproxTracker {
    /// address -> sequence of its last access. May transiently hold entries
    /// older than the window between cleanups; the range check in `process`
    /// treats those as missing.
    window: FxHashMap<u64, u64>,
    stats: StatsRegistry,
    sequence: u64,
    capacity: u64,
    last_cleanup: u64,
    clean_freq: u64,
    #[cfg(feature = "metrics")]
    metrics: TrackerMetrics,
}

impl ApproxTracker {
    /// Creates a tracker with the given window capacity.
    ///
    /// `capacity` 0 ([`UNLIMITED`](crate::tracker::UNLIMITED)) disables the
    /// window entirely: every re-access reports its full gap and nothing is
    /// ever reclaimed, so memory grows with the number of distinct
    /// addresses.
    pub fn new(capacity: u64) -> Self {
        Self {
            window: FxHashMap::default(),
            stats: StatsRegistry::new(),
            sequence: 1,
            capacity,
            last_cleanup: 0,
            clean_freq: capacity.max(MIN_CLEAN_FREQUENCY),
            #[cfg(feature = "metrics")]
            metrics: TrackerMetrics::default(),
        }
    }

    /// Returns the window capacity (0 = unlimited).
    #[inline]
    pub fn window_size(&self) -> u64 {
        self.capacity
    }

    /// Returns the sequence number the next reference will receive.
    #[inline]
    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the current cleanup pacing interval.
    #[inline]
    pub fn clean_frequency(&self) -> u64 {
        self.clean_freq
    }

    /// Processes one reference: records its sequence gap (or a miss at key
    /// 0) in the producer's histogram and stamps `access.address` with the
    /// current sequence.
    pub fn process(&mut self, access: Access) {
        #[cfg(feature = "metrics")]
        self.metrics.record_process();

        self.maybe_cleanup();

        let gap = match self.window.get(&access.address) {
            Some(&prev) => {
                let gap = self.sequence - prev;
                if self.capacity != UNLIMITED && gap >= self.capacity {
                    // Previous access aged out of the window; the entry just
                    // hasn't been reclaimed yet.
                    0
                } else {
                    gap
                }
            },
            None => 0,
        };

        #[cfg(feature = "metrics")]
        {
            if gap == 0 {
                self.metrics.record_miss();
            } else {
                self.metrics.record_hit();
            }
        }

        self.stats.get_or_create(access.id).update(gap);
        self.window.insert(access.address, self.sequence);
        self.sequence += 1;
    }

    /// Processes a batch of references in order.
    pub fn process_many(&mut self, accesses: &[Access]) {
        for &access in accesses {
            self.process(access);
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

    /// Returns the last-access sequence recorded for `address`, or 0 if the
    /// address is not in the active window.
    pub fn sequence_value(&self, address: u64) -> u64 {
        match self.window.get(&address) {
            Some(&seq) if self.capacity == UNLIMITED || self.sequence - seq < self.capacity => seq,
            _ => 0,
        }
    }

    /// Returns the addresses currently inside the window, oldest first.
    pub fn active_addresses(&self) -> Vec<u64> {
        let mut live: Vec<(u64, u64)> = self
            .window
            .iter()
            .filter(|(_, &seq)| self.capacity == UNLIMITED || self.sequence - seq < self.capacity)
            .map(|(&address, &seq)| (seq, address))
            .collect();
        live.sort_unstable();
        live.into_iter().map(|(_, address)| address).collect()
    }

    /// Advances the sequence counter by `count` without processing anything,
    /// fast-forwarding through an unsampled stretch of the stream.
    ///
    /// Stored entries keep their sequence values, so the next access to a
    /// pending address observes a gap inflated by `count` and may land
    /// outside the window.
    #[inline]
    pub fn increment_sequence(&mut self, count: u64) {
        self.sequence += count;
    }

    /// Reclaims every window entry that aged out of the window. A no-op for
    /// unlimited capacity.
    ///
    /// Called for you periodically during `process`; the reported distances
    /// are identical whether or not this ever runs.
    pub fn cleanup(&mut self) {
        if self.capacity == UNLIMITED {
            return;
        }
        let (sequence, capacity) = (self.sequence, self.capacity);
        #[cfg(feature = "metrics")]
        let before = self.window.len();
        self.window.retain(|_, seq| sequence - *seq < capacity);
        #[cfg(feature = "metrics")]
        self.metrics
            .record_cleanup((before - self.window.len()) as u64);
        self.last_cleanup = sequence;
    }

    /// Sets the cleanup pacing interval and immediately runs a cleanup.
    pub fn set_clean_frequency(&mut self, clean_freq: u64) {
        self.clean_freq = clean_freq;
        self.cleanup();
    }

    /// Writes all histograms to `out`, ids ascending.
    ///
    /// Per id: a `REUSESTATS\t<id>\t<capacity>\t<accesses>\t<misses>` header
    /// followed by one `\t<distance>\t<count>` line per nonzero distance.
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
                hist.write_plain(out)?;
            }
        }
        Ok(())
    }

    /// Writes all histograms to stdout.
    pub fn print(&self) -> io::Result<()> {
        self.write_stats(&mut io::stdout().lock())
    }

    /// Verifies histogram totals and window stamps.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        for (_, hist) in self.stats.iter() {
            hist.check_invariants()?;
        }
        for (&address, &seq) in &self.window {
            if seq == 0 || seq >= self.sequence {
                return Err(InvariantError::new(format!(
                    "address {address} stamped with sequence {seq}, engine at {}",
                    self.sequence
                )));
            }
        }
        Ok(())
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
            resident: self.window.len() as u64,
            tracked_ids: self.stats.len(),
        }
    }

    fn maybe_cleanup(&mut self) {
        if self.capacity == UNLIMITED {
            return;
        }
        if self.sequence - self.last_cleanup < self.clean_freq {
            return;
        }
        self.cleanup();
    }
}

impl Clone for ApproxTracker {
    /// Deep copy: the clone carries the source's window, histograms,
    /// sequence, and pacing interval, but starts its cleanup clock fresh.
    fn clone(&self) -> Self {
        Self {
            window: self.window.clone(),
            stats: self.stats.clone(),
            sequence: self.sequence,
            capacity: self.capacity,
            last_cleanup: 0,
            clean_freq: self.clean_freq,
            #[cfg(feature = "metrics")]
            metrics: self.metrics.clone(),
        }
    }
}

impl Extend<Access> for ApproxTracker {
    fn extend<T: IntoIterator<Item = Access>>(&mut self, iter: T) {
        for access in iter {
            self.process(access);
        }
    }
}
