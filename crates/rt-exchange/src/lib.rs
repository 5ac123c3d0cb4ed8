//! # rt-exchange
//!
//! Single-slot value exchange between a real-time thread (an audio render callback)
//! and a general purpose thread (a UI or event loop).
//!
//! The real-time side must never block, allocate or take an OS lock. The UI side can
//! afford a short wait. This crate provides the primitives that sit between the two:
//!
//! - [`SpinLock`] - test-and-set mutual exclusion with a scoped guard
//! - [`lockfree`] - wait-free single-producer/single-consumer exchanges
//!   ([`lockfree::SingleElementQueue`], [`lockfree::AtomicValue`])
//! - [`spin`] - spinlock protected exchanges usable from any number of threads
//!   ([`spin::SingleElementQueue`], [`spin::AtomicValue`])
//! - [`thread_role`] - optional thread affinity checks for exchange handles
//!
//! ## Exchange contract
//!
//! Every exchange type holds at most one value. A newer value always replaces an
//! older one that was never consumed (last-write-wins), and no operation allocates
//! after construction.
//!
//! ## Safety Guarantees
//!
//! - **No heap allocations** after construction
//! - **No blocking** in the lock-free family, a bounded spin in the spinlock family
//! - **No syscalls** on any push/pop/set/get path
//! - **No logging** on any push/pop/set/get path
//!
//! ## Usage
//!
//! ```rust
//! use rt_exchange::lockfree::SingleElementQueue;
//!
//! // Created once, outside the audio callback
//! let (mut producer, mut consumer) = SingleElementQueue::<[f32; 4]>::new();
//!
//! // Audio thread
//! producer.push(&[0.1, 0.2, 0.3, 0.4]);
//! producer.push(&[0.5, 0.6, 0.7, 0.8]);
//!
//! // UI thread: only the newest value survives
//! assert_eq!(consumer.pop(), Some(&[0.5, 0.6, 0.7, 0.8]));
//! assert_eq!(consumer.pop(), None);
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod lockfree;
pub mod prelude;
pub mod spin;
pub mod spin_lock;
pub mod thread_role;

pub use error::{ExchangeError, Result};
pub use spin_lock::{SpinLock, SpinLockGuard};
pub use thread_role::{Role, ThreadBound};

/// Check that the lock-free family runs on hardware atomics on this target.
///
/// Intended for start-up or test code. Logs the outcome at `debug` level.
///
/// The requirement is already enforced at compile time, since the lock-free family
/// does not build on targets without native 8-bit atomics. This function never fails
/// where the crate builds and exists so start-up code can assert the property
/// alongside its other checks.
///
/// # Errors
///
/// Returns [`ExchangeError::NotLockFree`] when the slot tag of the lock-free
/// family would be emulated with a lock on this target. Unreachable on every
/// target this crate compiles for.
///
/// # Example
///
/// ```rust
/// rt_exchange::assert_lock_free()?;
/// # Ok::<(), rt_exchange::ExchangeError>(())
/// ```
pub fn assert_lock_free() -> Result<()> {
    if lockfree::is_lock_free() {
        tracing::debug!("lock-free exchange uses native 8-bit atomics");
        Ok(())
    } else {
        tracing::error!("lock-free exchange is not supported by native atomics on this target");
        Err(ExchangeError::NotLockFree { atomic: "AtomicU8" })
    }
}
