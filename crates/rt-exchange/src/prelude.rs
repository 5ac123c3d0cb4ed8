//! Prelude for rt-exchange.
//!
//! The two families share type names, so they are re-exported under prefixed aliases.
//!
//! # Example
//!
//! ```rust
//! use rt_exchange::prelude::*;
//!
//! let (mut producer, mut consumer) = LockFreeQueue::<u8>::new();
//! producer.push(&1);
//! assert_eq!(consumer.pop(), Some(&1));
//!
//! let shared = SpinValue::new(2u8);
//! assert_eq!(shared.get(), 2);
//! ```

pub use crate::error::ExchangeError;
pub use crate::lockfree::{
    AtomicValue as LockFreeValue, QueueConsumer, QueueProducer,
    SingleElementQueue as LockFreeQueue, ValueReader, ValueWriter,
};
pub use crate::spin::{AtomicValue as SpinValue, SingleElementQueue as SpinQueue};
pub use crate::spin_lock::{SpinLock, SpinLockGuard};
pub use crate::thread_role::{Role, ThreadBound};
