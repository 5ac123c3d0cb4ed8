//! Spinlock protected exchanges usable from any number of threads.
//!
//! The types here behave like their [`lockfree`](crate::lockfree) counterparts but have
//! no thread count restriction: every operation takes `&self` and copies the value
//! while holding a [`SpinLock`]. The price is a short spin when two threads collide,
//! bounded by the time it takes to copy one `T`.
//!
//! - [`SingleElementQueue`] - at most one pending value, last-write-wins
//! - [`AtomicValue`] - the latest value, always readable
//!
//! Share them through `Arc` or a `'static`, no handles are involved.

#![expect(
    unsafe_code,
    reason = "the guarded cell is only dereferenced while the spin lock is held"
)]

mod queue;
mod value;

use core::cell::UnsafeCell;
use core::fmt;

use crate::spin_lock::SpinLock;

pub use queue::SingleElementQueue;
pub use value::AtomicValue;

/// A value that can only be reached while holding its spin lock.
struct Guarded<T> {
    spin_lock: SpinLock,
    data: UnsafeCell<T>,
}

// SAFETY: `data` is only reached through `with`, which holds `spin_lock` for the whole
// access, so at most one thread touches the value at a time.
unsafe impl<T: Send> Sync for Guarded<T> {}

impl<T> Guarded<T> {
    const fn new(data: T) -> Self {
        Self {
            spin_lock: SpinLock::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// Run `f` on the value inside the critical section.
    #[inline]
    fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let _lock = self.spin_lock.acquire();
        // SAFETY: the guard above is alive until the end of this function, so no other
        // reference to `data` exists while `f` runs.
        f(unsafe { &mut *self.data.get() })
    }
}

impl<T> fmt::Debug for Guarded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("spin_lock", &self.spin_lock)
            .finish_non_exhaustive()
    }
}
