//! reusekit: reuse-distance histograms for tagged memory address streams.
//!
//! Feed `(id, address)` records to a tracker; for each reference it reports
//! how many distinct addresses were touched since the previous access to the
//! same address, and accumulates the answers into per-id histograms. See
//! `DESIGN.md` for internal architecture and invariants.

pub mod builder;
pub mod ds;
pub mod error;
pub mod prelude;
pub mod stats;
pub mod tracker;
pub mod traits;

#[cfg(feature = "metrics")]
pub mod metrics;
