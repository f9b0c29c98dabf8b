//! Unified builder over the two engine variants.
//!
//! Hides the exact/approx split behind one wrapper type so callers can pick
//! the distance definition with a policy value instead of a concrete type.
//!
//! ## Example
//!
//! ```rust
//! use reusekit::builder::{TrackerBuilder, TrackerPolicy};
//! use reusekit::tracker::Access;
//!
//! let mut tracker = TrackerBuilder::new(1024).build(TrackerPolicy::Approx);
//! tracker.process(Access::new(0, 0xDEAD));
//! tracker.process(Access::new(0, 0xDEAD));
//! assert_eq!(tracker.stats(0).unwrap().count_distance(1), 1);
//! ```

use std::io;

use crate::stats::DistanceHistogram;
use crate::tracker::{Access, ApproxTracker, ExactTracker, DEFAULT_BIN_INDIVIDUAL};
use crate::traits::DistanceTracker;

/// Which distance definition a built [`Tracker`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPolicy {
    /// Exact LRU stack distance with power-of-two bucketing above the
    /// threshold.
    Exact { bin_individual: u64 },
    /// Raw sequence gap with periodic window cleanup.
    Approx,
}

impl TrackerPolicy {
    /// Exact policy with the default bucketing threshold.
    pub fn exact() -> Self {
        Self::Exact {
            bin_individual: DEFAULT_BIN_INDIVIDUAL,
        }
    }
}

/// Builder carrying the window capacity shared by both variants.
#[derive(Debug, Clone, Copy)]
pub struct TrackerBuilder {
    capacity: u64,
}

impl TrackerBuilder {
    /// Starts a builder for trackers with the given window capacity
    /// (0 = unlimited).
    pub fn new(capacity: u64) -> Self {
        Self { capacity }
    }

    /// Builds a tracker with the chosen policy.
    pub fn build(&self, policy: TrackerPolicy) -> Tracker {
        let inner = match policy {
            TrackerPolicy::Exact { bin_individual } => TrackerInner::Exact(
                ExactTracker::with_bin_individual(self.capacity, bin_individual),
            ),
            TrackerPolicy::Approx => TrackerInner::Approx(ApproxTracker::new(self.capacity)),
        };
        Tracker { inner }
    }
}

/// Policy-erased reuse-distance tracker.
#[derive(Debug, Clone)]
pub struct Tracker {
    inner: TrackerInner,
}

#[derive(Debug, Clone)]
enum TrackerInner {
    Exact(ExactTracker),
    Approx(ApproxTracker),
}

impl Tracker {
    /// Processes one reference.
    pub fn process(&mut self, access: Access) {
        match &mut self.inner {
            TrackerInner::Exact(tracker) => tracker.process(access),
            TrackerInner::Approx(tracker) => tracker.process(access),
        }
    }

    /// Processes a batch of references in order.
    pub fn process_many(&mut self, accesses: &[Access]) {
        match &mut self.inner {
            TrackerInner::Exact(tracker) => tracker.process_many(accesses),
            TrackerInner::Approx(tracker) => tracker.process_many(accesses),
        }
    }

    /// Returns the histogram for `id`, if that id has been processed.
    pub fn stats(&self, id: u64) -> Option<&DistanceHistogram> {
        match &self.inner {
            TrackerInner::Exact(tracker) => tracker.stats(id),
            TrackerInner::Approx(tracker) => tracker.stats(id),
        }
    }

    /// Returns every producer id seen so far, in unspecified order.
    pub fn indices(&self) -> Vec<u64> {
        match &self.inner {
            TrackerInner::Exact(tracker) => tracker.indices(),
            TrackerInner::Approx(tracker) => tracker.indices(),
        }
    }

    /// Returns the window capacity (0 = unlimited).
    pub fn window_size(&self) -> u64 {
        match &self.inner {
            TrackerInner::Exact(tracker) => tracker.capacity(),
            TrackerInner::Approx(tracker) => tracker.window_size(),
        }
    }

    /// Writes all histograms to `out`, ids ascending.
    pub fn write_stats<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        match &self.inner {
            TrackerInner::Exact(tracker) => tracker.write_stats(out),
            TrackerInner::Approx(tracker) => tracker.write_stats(out),
        }
    }

    /// Returns the underlying exact engine, if this tracker was built with
    /// [`TrackerPolicy::Exact`].
    pub fn as_exact(&self) -> Option<&ExactTracker> {
        match &self.inner {
            TrackerInner::Exact(tracker) => Some(tracker),
            TrackerInner::Approx(_) => None,
        }
    }

    /// Returns the underlying approx engine, if this tracker was built with
    /// [`TrackerPolicy::Approx`].
    pub fn as_approx(&self) -> Option<&ApproxTracker> {
        match &self.inner {
            TrackerInner::Exact(_) => None,
            TrackerInner::Approx(tracker) => Some(tracker),
        }
    }
}

impl DistanceTracker for Tracker {
    fn process(&mut self, access: Access) {
        Tracker::process(self, access);
    }

    fn stats(&self, id: u64) -> Option<&DistanceHistogram> {
        Tracker::stats(self, id)
    }

    fn indices(&self) -> Vec<u64> {
        Tracker::indices(self)
    }

    fn window_size(&self) -> u64 {
        Tracker::window_size(self)
    }

    fn current_sequence(&self) -> u64 {
        match &self.inner {
            TrackerInner::Exact(tracker) => tracker.current_sequence(),
            TrackerInner::Approx(tracker) => tracker.current_sequence(),
        }
    }

    fn write_stats(&self, mut out: &mut dyn io::Write) -> io::Result<()> {
        Tracker::write_stats(self, &mut out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_policy_reports_stack_distance() {
        let mut tracker = TrackerBuilder::new(0).build(TrackerPolicy::exact());
        for addr in [0u64, 1, 1, 0] {
            tracker.process(Access::new(0, addr));
        }
        // Only one distinct address between the two accesses to 0.
        assert_eq!(tracker.stats(0).unwrap().count_distance(2), 1);
        assert!(tracker.as_exact().is_some());
        assert!(tracker.as_approx().is_none());
    }

    #[test]
    fn approx_policy_reports_sequence_gap() {
        let mut tracker = TrackerBuilder::new(0).build(TrackerPolicy::Approx);
        for addr in [0u64, 1, 1, 0] {
            tracker.process(Access::new(0, addr));
        }
        // Three references between the two accesses to 0.
        assert_eq!(tracker.stats(0).unwrap().count_distance(3), 1);
        assert!(tracker.as_approx().is_some());
    }

    #[test]
    fn builder_carries_capacity() {
        let builder = TrackerBuilder::new(77);
        assert_eq!(builder.build(TrackerPolicy::exact()).window_size(), 77);
        assert_eq!(builder.build(TrackerPolicy::Approx).window_size(), 77);
    }

    #[test]
    fn policy_with_custom_threshold() {
        let mut tracker = TrackerBuilder::new(0).build(TrackerPolicy::Exact { bin_individual: 2 });
        for addr in [0u64, 1, 2, 0] {
            tracker.process(Access::new(0, addr));
        }
        // Distance 3 is above the threshold: bucketed to 4.
        assert_eq!(tracker.stats(0).unwrap().count_distance(4), 1);
    }
}
