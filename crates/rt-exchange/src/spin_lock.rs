//! Test-and-set spin lock with a scoped guard.
//!
//! [`SpinLock`] is the only mutual exclusion used by this crate. It is built from a
//! single [`AtomicBool`] and never yields to the OS scheduler, so it is usable from a
//! real-time thread as long as the critical sections it protects stay short.
//!
//! # RT Safety
//!
//! - No syscalls: acquisition is a busy loop around one atomic swap
//! - No allocation
//! - Unbounded under contention: a thread can spin for as long as another holds
//!   the lock

use core::fmt;
use core::hint;
use core::sync::atomic::{AtomicBool, Ordering};

/// A spin lock built on an atomic test-and-set flag.
///
/// The lock does not own data. Holding a [`SpinLockGuard`] is the only way to be
/// inside the critical section and dropping it is the only way to leave it.
///
/// # Example
///
/// ```rust
/// use rt_exchange::SpinLock;
///
/// let spin_lock = SpinLock::new();
/// {
///     let _lock = spin_lock.acquire();
///     assert!(spin_lock.is_locked());
/// } // released here
/// assert!(!spin_lock.is_locked());
/// ```
pub struct SpinLock {
    flag: AtomicBool,
}

/// Scoped ownership of a [`SpinLock`].
///
/// Not `Clone`; it can be moved, which moves the critical section with it.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct SpinLockGuard<'a> {
    spin_lock: &'a SpinLock,
}

impl SpinLock {
    /// Create an unlocked spin lock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Spin until the lock is acquired.
    ///
    /// # RT Safety
    ///
    /// No syscalls and no yielding. The wait is bounded only by how long the
    /// current holder keeps the guard.
    #[inline]
    pub fn acquire(&self) -> SpinLockGuard<'_> {
        while self.flag.swap(true, Ordering::Acquire) {
            hint::spin_loop();
        }
        SpinLockGuard { spin_lock: self }
    }

    /// Try to acquire the lock once, without spinning.
    #[inline]
    pub fn try_acquire(&self) -> Option<SpinLockGuard<'_>> {
        if self.flag.swap(true, Ordering::Acquire) {
            None
        } else {
            Some(SpinLockGuard { spin_lock: self })
        }
    }

    /// Whether some guard currently holds the lock.
    ///
    /// Diagnostic only: the answer can be stale by the time it is returned.
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    #[inline]
    fn release(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpinLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl Drop for SpinLockGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        self.spin_lock.release();
    }
}

impl fmt::Debug for SpinLockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLockGuard").finish_non_exhaustive()
    }
}
