pub mod histogram;
pub mod registry;

pub use histogram::DistanceHistogram;
pub use registry::StatsRegistry;
