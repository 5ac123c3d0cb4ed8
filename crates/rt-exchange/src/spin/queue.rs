//! Spinlock protected single element queue.

use core::any;
use core::fmt;
use core::mem;

use super::Guarded;

/// Pending element plus its "has a value" flag.
struct Slot<T> {
    element: T,
    is_empty: bool,
}

/// Queue with room for exactly one value, safe for any number of threads.
///
/// Pushing always succeeds and replaces a value nobody popped yet. Popping copies the
/// value out under the lock.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rt_exchange::spin::SingleElementQueue;
///
/// let queue = Arc::new(SingleElementQueue::<u32>::new());
///
/// let producer = Arc::clone(&queue);
/// std::thread::spawn(move || producer.push(&7))
///     .join()
///     .map_err(|_| "producer panicked")?;
///
/// let mut out = 0;
/// assert!(queue.pop(&mut out));
/// assert_eq!(out, 7);
/// assert!(!queue.pop(&mut out));
/// # Ok::<(), &'static str>(())
/// ```
pub struct SingleElementQueue<T> {
    slot: Guarded<Slot<T>>,
}

impl<T: Default> SingleElementQueue<T> {
    /// Create an empty queue backed by `T::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_storage(T::default())
    }
}

impl<T: Default> Default for SingleElementQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SingleElementQueue<T> {
    /// Create a queue that already holds `element`.
    #[must_use]
    pub fn with_element(element: T) -> Self {
        Self::from_slot(Slot {
            element,
            is_empty: false,
        })
    }

    /// Create an empty queue using `storage` as the backing value.
    ///
    /// For payloads without a `Default`. `storage` is never popped.
    #[must_use]
    pub fn with_storage(storage: T) -> Self {
        Self::from_slot(Slot {
            element: storage,
            is_empty: true,
        })
    }

    fn from_slot(slot: Slot<T>) -> Self {
        tracing::trace!(
            payload = any::type_name::<T>(),
            payload_size = mem::size_of::<T>(),
            pending = !slot.is_empty,
            "spin lock single element queue created"
        );
        Self {
            slot: Guarded::new(slot),
        }
    }

    /// Copy `element` into the queue, replacing any value not popped yet.
    ///
    /// # RT Safety
    ///
    /// No allocation when `T::clone_from` does not allocate. May spin while another
    /// thread copies a value in or out.
    #[inline]
    pub fn push(&self, element: &T)
    where
        T: Clone,
    {
        self.slot.with(|slot| {
            slot.element.clone_from(element);
            slot.is_empty = false;
        });
    }

    /// Copy the pending value into `out` and mark the queue empty.
    ///
    /// Returns `false` and leaves `out` untouched if the queue is empty.
    #[inline]
    pub fn pop(&self, out: &mut T) -> bool
    where
        T: Clone,
    {
        self.slot.with(|slot| {
            if slot.is_empty {
                return false;
            }
            out.clone_from(&slot.element);
            slot.is_empty = true;
            true
        })
    }

    /// Pop the pending value into a fresh `T`.
    ///
    /// **NOT RT-safe** for payloads whose `clone` allocates.
    #[inline]
    pub fn pop_value(&self) -> Option<T>
    where
        T: Clone,
    {
        self.slot.with(|slot| {
            if slot.is_empty {
                return None;
            }
            slot.is_empty = true;
            Some(slot.element.clone())
        })
    }

    /// Whether there is no pending value.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slot.with(|slot| slot.is_empty)
    }
}

impl<T> fmt::Debug for SingleElementQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleElementQueue")
            .field("is_empty", &self.is_empty())
            .finish()
    }
}
