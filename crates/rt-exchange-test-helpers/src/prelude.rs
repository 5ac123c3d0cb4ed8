//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use rt_exchange_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_join, must_some, must_with};
pub use crate::tracked::{TRACKED_WORDS, Tracked, TrackedCounters};
pub use crate::{assert_all_within, assert_intact, assert_monotonic};

#[cfg(feature = "tracking")]
pub use crate::tracking::{AllocationGuard, track};

#[cfg(feature = "tracking")]
pub use crate::assert_rt_safe;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
