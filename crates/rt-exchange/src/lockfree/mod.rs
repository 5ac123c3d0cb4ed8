//! Wait-free single-producer/single-consumer exchanges.
//!
//! Both types in this module are built on a three-cell storage: the producer owns one
//! cell, the consumer owns another and the third sits in a shared slot. Publishing a
//! value or taking one is a single atomic swap of the slot, so no operation ever waits
//! for the other side.
//!
//! - [`SingleElementQueue`] - a mailbox: each value is delivered at most once
//! - [`AtomicValue`] - a register: the reader always sees the latest value
//!
//! # Roles
//!
//! Constructors return a producer handle and a consumer handle. Handles are `Send` but
//! not `Clone`, and every role operation takes `&mut self`, so there is never more than
//! one producer and one consumer. Either role may live on the real-time thread.
//!
//! # RT Safety
//!
//! Construction allocates (one `Arc`). Every other operation is allocation-free,
//! syscall-free and completes in a bounded number of steps. Copies into a cell go
//! through [`Clone::clone_from`], which lets payloads such as a pre-sized `Vec` reuse
//! their buffer.

mod queue;
mod storage;
mod value;

pub use queue::{QueueConsumer, QueueProducer, SingleElementQueue};
pub use value::{AtomicValue, ValueReader, ValueWriter};

/// Whether the slot exchange of this module uses native atomic instructions.
///
/// Always `true` wherever this crate compiles: the slot is an `AtomicU8` and its
/// `swap` only exists on targets with native 8-bit atomics. Kept so callers can
/// state the requirement explicitly.
#[inline]
#[must_use]
pub const fn is_lock_free() -> bool {
    cfg!(target_has_atomic = "8")
}
