//! Shared test utilities for rt-exchange.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`assertions`] - Assertions for values observed across an exchange
//! - [`tracking`] - Allocation tracking for RT safety tests
//! - [`tracked`] - A payload that counts its copies and detects torn ones
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! rt-exchange-test-helpers = { workspace = true }
//! ```
//!
//! Then import the prelude:
//!
//! ```rust,ignore
//! use rt_exchange_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod assertions;
pub mod must;
pub mod prelude;
pub mod tracked;

#[cfg(feature = "tracking")]
#[cfg_attr(docsrs, doc(cfg(feature = "tracking")))]
pub mod tracking;

#[cfg(all(test, feature = "tracking"))]
#[global_allocator]
static GLOBAL_TEST: tracking::TrackingAllocator = tracking::TrackingAllocator;

pub use must::*;
pub use tracked::Tracked;

#[cfg(feature = "tracking")]
pub use tracking::track;
