//! Lock-free single element queue.
//!
//! A mailbox holding at most one value. The producer publishes, the consumer takes.
//! If the producer publishes twice before the consumer takes, the first value is
//! dropped without notice: last-write-wins.

#![expect(
    unsafe_code,
    reason = "handles access their own storage cell through the CellToken they own"
)]

use core::any;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use std::sync::Arc;

use super::storage::{CellToken, SingleElementStorage};

/// Single-producer/single-consumer queue with room for exactly one value.
///
/// The queue itself is never handled directly: [`new`](Self::new) and
/// [`with_value`](Self::with_value) return a [`QueueProducer`] and a
/// [`QueueConsumer`] sharing it.
///
/// # Example
///
/// ```rust
/// use rt_exchange::lockfree::SingleElementQueue;
///
/// let (mut producer, mut consumer) = SingleElementQueue::<u32>::new();
///
/// // Nothing pushed yet
/// assert_eq!(consumer.pop(), None);
///
/// producer.push(&1);
/// producer.push(&2);
///
/// // Only the newest value is delivered
/// assert_eq!(consumer.pop(), Some(&2));
/// assert_eq!(consumer.pop(), None);
///
/// // The last popped value stays readable
/// assert_eq!(consumer.last(), &2);
/// ```
pub struct SingleElementQueue<T> {
    storage: SingleElementStorage<T>,
}

/// Producing half of a [`SingleElementQueue`].
pub struct QueueProducer<T> {
    queue: Arc<SingleElementQueue<T>>,
    cell: CellToken,
    overwritten: u64,
    _marker: PhantomData<T>,
}

/// Consuming half of a [`SingleElementQueue`].
pub struct QueueConsumer<T> {
    queue: Arc<SingleElementQueue<T>>,
    cell: CellToken,
    _marker: PhantomData<T>,
}

impl<T: Default> SingleElementQueue<T> {
    /// Create an empty queue whose cells start out as `T::default()`.
    ///
    /// Until the first pop, [`QueueConsumer::last`] returns the default value.
    ///
    /// # RT Safety
    ///
    /// Allocates. Call during initialization only.
    #[must_use]
    pub fn new() -> (QueueProducer<T>, QueueConsumer<T>) {
        Self::from_cells([T::default(), T::default(), T::default()])
    }
}

impl<T: Clone> SingleElementQueue<T> {
    /// Create an empty queue whose cells start out as copies of `initial`.
    ///
    /// Use this when `T` has no meaningful default, or when [`QueueConsumer::last`]
    /// must return a specific value before anything was pushed.
    ///
    /// # RT Safety
    ///
    /// Allocates. Call during initialization only.
    #[must_use]
    pub fn with_value(initial: T) -> (QueueProducer<T>, QueueConsumer<T>) {
        Self::from_cells([initial.clone(), initial.clone(), initial])
    }
}

impl<T> SingleElementQueue<T> {
    fn from_cells(cells: [T; 3]) -> (QueueProducer<T>, QueueConsumer<T>) {
        let (storage, push, pop) = SingleElementStorage::new(cells);
        let queue = Arc::new(Self { storage });

        tracing::trace!(
            payload = any::type_name::<T>(),
            payload_size = mem::size_of::<T>(),
            "lock-free single element queue created"
        );

        (
            QueueProducer {
                queue: Arc::clone(&queue),
                cell: push,
                overwritten: 0,
                _marker: PhantomData,
            },
            QueueConsumer {
                queue,
                cell: pop,
                _marker: PhantomData,
            },
        )
    }

    /// Whether the exchange runs on native atomics on this target.
    #[inline]
    #[must_use]
    pub const fn is_lock_free() -> bool {
        super::is_lock_free()
    }
}

impl<T> fmt::Debug for SingleElementQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleElementQueue")
            .field("storage", &self.storage)
            .finish()
    }
}

impl<T> QueueProducer<T> {
    /// Copy `value` into the queue, replacing any value not popped yet.
    ///
    /// # RT Safety
    ///
    /// RT-safe as long as `T::clone_from` is. One atomic swap.
    #[inline]
    pub fn push(&mut self, value: &T)
    where
        T: Clone,
    {
        self.update_and_push(|cell| cell.clone_from(value));
    }

    /// Build the next value in place, then publish it.
    ///
    /// `update` receives the producer's private cell. It holds a previously published
    /// value, not necessarily the latest one, so `update` must write every field the
    /// consumer relies on.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rt_exchange::lockfree::SingleElementQueue;
    ///
    /// let (mut producer, mut consumer) = SingleElementQueue::with_value([0.0_f32; 64]);
    ///
    /// producer.update_and_push(|block| block.fill(0.5));
    /// assert_eq!(consumer.pop().map(|block| block[63]), Some(0.5));
    /// ```
    #[inline]
    pub fn update_and_push<F>(&mut self, update: F)
    where
        F: FnOnce(&mut T),
    {
        // SAFETY: `self.cell` was issued by this queue's storage
        update(unsafe { self.queue.storage.get_mut(&mut self.cell) });
        self.publish();
    }

    /// Build the next value in place and publish it only if `update` returns `true`.
    ///
    /// Returns whatever `update` returned. When nothing is published, partial writes
    /// stay in the producer's private cell and are never seen by the consumer.
    #[inline]
    pub fn update_and_push_if<F>(&mut self, update: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        // SAFETY: `self.cell` was issued by this queue's storage
        let publish = update(unsafe { self.queue.storage.get_mut(&mut self.cell) });
        if publish {
            self.publish();
        }
        publish
    }

    /// Whether the last published value is still waiting for the consumer.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.queue.storage.is_empty()
    }

    /// Number of values replaced before the consumer popped them.
    #[inline]
    #[must_use]
    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }

    /// Whether the consumer has been dropped.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.queue) == 1
    }

    #[inline]
    fn publish(&mut self) {
        self.queue.storage.store(&mut self.cell);
        if self.cell.is_fresh() {
            self.overwritten = self.overwritten.wrapping_add(1);
        }
    }
}

impl<T> fmt::Debug for QueueProducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueProducer")
            .field("has_pending", &self.has_pending())
            .field("overwritten", &self.overwritten)
            .finish_non_exhaustive()
    }
}

impl<T> QueueConsumer<T> {
    /// Take the newest value if one was pushed since the last pop.
    ///
    /// The reference points into the consumer's private cell and stays valid until
    /// the next call taking `&mut self`.
    ///
    /// # RT Safety
    ///
    /// RT-safe. One relaxed load when empty, one atomic swap otherwise.
    #[inline]
    pub fn pop(&mut self) -> Option<&T> {
        if self.take_fresh() {
            Some(self.current())
        } else {
            None
        }
    }

    /// Copy the newest value into `out` if one was pushed since the last pop.
    ///
    /// Returns `false` and leaves `out` untouched when there is nothing new.
    #[inline]
    pub fn pop_into(&mut self, out: &mut T) -> bool
    where
        T: Clone,
    {
        if self.take_fresh() {
            out.clone_from(self.current());
            true
        } else {
            false
        }
    }

    /// The most recently popped value, or the initial value if nothing was popped.
    ///
    /// Never consumes anything.
    #[inline]
    #[must_use]
    pub fn last(&self) -> &T {
        self.current()
    }

    /// Pop the newest value if there is one, otherwise return [`last`](Self::last).
    #[inline]
    pub fn pop_or_last(&mut self) -> &T {
        self.take_fresh();
        self.current()
    }

    /// Whether a pushed value is waiting to be popped.
    #[inline]
    #[must_use]
    pub fn has_update(&self) -> bool {
        !self.queue.storage.is_empty()
    }

    /// Whether the producer has been dropped.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.queue) == 1
    }

    /// Swap the private cell with the slot if the slot holds a fresh value.
    ///
    /// Only this consumer clears the fresh bit, so a fresh slot observed here is
    /// still fresh when the swap happens.
    #[inline]
    fn take_fresh(&mut self) -> bool {
        if self.queue.storage.is_empty() {
            return false;
        }
        self.queue.storage.load(&mut self.cell);
        self.cell.is_fresh()
    }

    #[inline]
    fn current(&self) -> &T {
        // SAFETY: `self.cell` was issued by this queue's storage
        unsafe { self.queue.storage.get(&self.cell) }
    }
}

impl<T> fmt::Debug for QueueConsumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueConsumer")
            .field("has_update", &self.has_update())
            .finish_non_exhaustive()
    }
}
