//! Spinlock protected atomic value.

use core::any;
use core::fmt;
use core::mem;

use super::Guarded;

/// Latest-value register readable and writable from any thread.
///
/// Unlike [`crate::lockfree::AtomicValue`] there are no handles: share it through `Arc`
/// and call every method on `&self`.
///
/// # Example
///
/// ```rust
/// use rt_exchange::spin::AtomicValue;
///
/// let gain = AtomicValue::new(1.0_f32);
/// gain.set(&0.5);
/// gain.update(|g| *g *= 2.0);
/// assert_eq!(gain.get(), 1.0);
/// ```
pub struct AtomicValue<T> {
    value: Guarded<T>,
}

impl<T> AtomicValue<T> {
    /// Create a register holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        tracing::trace!(
            payload = any::type_name::<T>(),
            payload_size = mem::size_of::<T>(),
            "spin lock atomic value created"
        );
        Self {
            value: Guarded::new(initial),
        }
    }

    /// A copy of the current value.
    ///
    /// **NOT RT-safe** for payloads whose `clone` allocates, use
    /// [`get_into`](Self::get_into) there.
    #[inline]
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.with(|value| value.clone())
    }

    /// Copy the current value into `out`.
    ///
    /// # RT Safety
    ///
    /// No allocation when `T::clone_from` does not allocate. May spin while another
    /// thread holds the lock.
    #[inline]
    pub fn get_into(&self, out: &mut T)
    where
        T: Clone,
    {
        self.value.with(|value| out.clone_from(value));
    }

    /// Replace the current value with a copy of `value`.
    #[inline]
    pub fn set(&self, value: &T)
    where
        T: Clone,
    {
        self.value.with(|current| current.clone_from(value));
    }

    /// Modify the current value in place while holding the lock.
    ///
    /// Read-modify-write is atomic with respect to every other method. `update` must
    /// not call back into this value, the lock is not reentrant.
    #[inline]
    pub fn update<F>(&self, update: F)
    where
        F: FnOnce(&mut T),
    {
        self.value.with(update);
    }
}

impl<T: Default> Default for AtomicValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// Formats a copy so the lock is held for one clone, never for the formatter's I/O
impl<T: Clone + fmt::Debug> fmt::Debug for AtomicValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.get();
        f.debug_struct("AtomicValue").field("value", &value).finish()
    }
}
