//! Trait seam shared by the reuse-distance engines.
//!
//! Both engines expose the same streaming surface: feed [`Access`] records,
//! read per-producer histograms, dump the tab-separated report. Code that
//! does not care which distance definition is in play (exact stack distance
//! vs. sequence gap) can be written against [`DistanceTracker`] and handed
//! either engine, or the unified [`Tracker`](crate::builder::Tracker)
//! wrapper.

use std::io;

use crate::stats::DistanceHistogram;
use crate::tracker::Access;

/// Common contract of the streaming reuse-distance engines.
pub trait DistanceTracker {
    /// Processes one reference.
    fn process(&mut self, access: Access);

    /// Processes a batch of references in order.
    fn process_many(&mut self, accesses: &[Access]) {
        for &access in accesses {
            self.process(access);
        }
    }

    /// Returns the histogram for `id`, if that id has been processed.
    fn stats(&self, id: u64) -> Option<&DistanceHistogram>;

    /// Returns every producer id seen so far, in unspecified order.
    fn indices(&self) -> Vec<u64>;

    /// Returns the window capacity (0 = unlimited).
    fn window_size(&self) -> u64;

    /// Returns the sequence number the next reference will receive.
    fn current_sequence(&self) -> u64;

    /// Writes all histograms to `out`, ids ascending.
    fn write_stats(&self, out: &mut dyn io::Write) -> io::Result<()>;
}

impl DistanceTracker for crate::tracker::ExactTracker {
    fn process(&mut self, access: Access) {
        crate::tracker::ExactTracker::process(self, access);
    }

    fn stats(&self, id: u64) -> Option<&DistanceHistogram> {
        crate::tracker::ExactTracker::stats(self, id)
    }

    fn indices(&self) -> Vec<u64> {
        crate::tracker::ExactTracker::indices(self)
    }

    fn window_size(&self) -> u64 {
        self.capacity()
    }

    fn current_sequence(&self) -> u64 {
        crate::tracker::ExactTracker::current_sequence(self)
    }

    fn write_stats(&self, mut out: &mut dyn io::Write) -> io::Result<()> {
        crate::tracker::ExactTracker::write_stats(self, &mut out)
    }
}

impl DistanceTracker for crate::tracker::ApproxTracker {
    fn process(&mut self, access: Access) {
        crate::tracker::ApproxTracker::process(self, access);
    }

    fn stats(&self, id: u64) -> Option<&DistanceHistogram> {
        crate::tracker::ApproxTracker::stats(self, id)
    }

    fn indices(&self) -> Vec<u64> {
        crate::tracker::ApproxTracker::indices(self)
    }

    fn window_size(&self) -> u64 {
        crate::tracker::ApproxTracker::window_size(self)
    }

    fn current_sequence(&self) -> u64 {
        crate::tracker::ApproxTracker::current_sequence(self)
    }

    fn write_stats(&self, mut out: &mut dyn io::Write) -> io::Result<()> {
        crate::tracker::ApproxTracker::write_stats(self, &mut out)
    }
}
