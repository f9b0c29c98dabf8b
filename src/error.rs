//! Error types for the reusekit library.
//!
//! ## Key Components
//!
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods on [`RankTree`](crate::ds::RankTree)
//!   and [`ExactTracker`](crate::tracker::ExactTracker)).
//!
//! Normal processing has no recoverable errors: `process` never fails, and a
//! miss is an observation recorded in the histogram, not an error. Output
//! errors from `write_stats` propagate as `std::io::Error`.

use std::fmt;

/// Error returned when internal tracker invariants are violated.
///
/// Produced by `check_invariants` methods. Carries a human-readable
/// description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}
