pub use crate::builder::{Tracker, TrackerBuilder, TrackerPolicy};
pub use crate::ds::{RankTree, RecencyEntry};
pub use crate::stats::{DistanceHistogram, StatsRegistry};
pub use crate::tracker::{
    Access, ApproxTracker, ExactTracker, DEFAULT_BIN_INDIVIDUAL, MIN_CLEAN_FREQUENCY, UNLIMITED,
};
pub use crate::traits::DistanceTracker;

#[cfg(feature = "metrics")]
pub use crate::metrics::{TrackerMetrics, TrackerMetricsSnapshot};
