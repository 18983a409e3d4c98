//! ferrosync testing suite
//!
//! Integration tests live in `tests/`, benchmarks in `benches/`. This
//! library holds the fixtures both share.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Unified test utilities
///
/// Tree builders, timestamp setters and a recording observer used across
/// the integration tests and benchmarks.
pub mod test_utils;

pub use test_utils::*;
