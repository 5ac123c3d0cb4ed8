//! Lock-free atomic value.
//!
//! A register rather than a mailbox: the reader never sees "nothing", it sees the
//! latest value the writer completed, or the initial value.

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

/// Single-writer/single-reader register holding the latest value.
///
/// # Example
///
/// ```rust
/// use rt_exchange::lockfree::AtomicValue;
///
/// let (mut writer, mut reader) = AtomicValue::new(0.0_f32);
/// assert_eq!(*reader.get(), 0.0);
///
/// writer.set(&0.75);
/// assert_eq!(*reader.get(), 0.75);
///
/// // Reading again returns the same value
/// assert_eq!(*reader.get(), 0.75);
/// ```
pub struct AtomicValue<T> {
    storage: SingleElementStorage<T>,
}

/// Writing half of an [`AtomicValue`].
pub struct ValueWriter<T> {
    value: Arc<AtomicValue<T>>,
    cell: CellToken,
    _marker: PhantomData<T>,
}

/// Reading half of an [`AtomicValue`].
pub struct ValueReader<T> {
    value: Arc<AtomicValue<T>>,
    cell: CellToken,
    _marker: PhantomData<T>,
}

impl<T: Clone> AtomicValue<T> {
    /// Create a register holding `initial`.
    ///
    /// # RT Safety
    ///
    /// Allocates. Call during initialization only.
    #[must_use]
    pub fn new(initial: T) -> (ValueWriter<T>, ValueReader<T>) {
        Self::from_cells([initial.clone(), initial.clone(), initial])
    }
}

impl<T: Default> AtomicValue<T> {
    /// Create a register holding `T::default()`.
    #[must_use]
    pub fn with_default() -> (ValueWriter<T>, ValueReader<T>) {
        Self::from_cells([T::default(), T::default(), T::default()])
    }
}

impl<T> AtomicValue<T> {
    fn from_cells(cells: [T; 3]) -> (ValueWriter<T>, ValueReader<T>) {
        let (storage, write, read) = SingleElementStorage::new(cells);
        let value = Arc::new(Self { storage });

        tracing::trace!(
            payload = any::type_name::<T>(),
            payload_size = mem::size_of::<T>(),
            "lock-free atomic value created"
        );

        (
            ValueWriter {
                value: Arc::clone(&value),
                cell: write,
                _marker: PhantomData,
            },
            ValueReader {
                value,
                cell: read,
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

impl<T> fmt::Debug for AtomicValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicValue")
            .field("storage", &self.storage)
            .finish()
    }
}

impl<T> ValueWriter<T> {
    /// Replace the current value with a copy of `value`.
    ///
    /// # RT Safety
    ///
    /// RT-safe as long as `T::clone_from` is. One atomic swap.
    #[inline]
    pub fn set(&mut self, value: &T)
    where
        T: Clone,
    {
        self.update(|cell| cell.clone_from(value));
    }

    /// Build the next value in place, then publish it.
    ///
    /// `update` receives the writer's private cell, which holds an older value, not
    /// necessarily the current one.
    #[inline]
    pub fn update<F>(&mut self, update: F)
    where
        F: FnOnce(&mut T),
    {
        // SAFETY: `self.cell` was issued by this value's storage
        update(unsafe { self.value.storage.get_mut(&mut self.cell) });
        self.value.storage.store(&mut self.cell);
    }

    /// Build the next value in place and publish it only if `update` returns `true`.
    #[inline]
    pub fn update_if<F>(&mut self, update: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        // SAFETY: `self.cell` was issued by this value's storage
        let publish = update(unsafe { self.value.storage.get_mut(&mut self.cell) });
        if publish {
            self.value.storage.store(&mut self.cell);
        }
        publish
    }

    /// Whether the reader has been dropped.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.value) == 1
    }
}

impl<T> fmt::Debug for ValueWriter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueWriter").finish_non_exhaustive()
    }
}

impl<T> ValueReader<T> {
    /// The latest value completed by the writer.
    ///
    /// Returns the initial value until the first `set`. The reference stays valid
    /// until the next call taking `&mut self`.
    ///
    /// # RT Safety
    ///
    /// RT-safe. One relaxed load when nothing changed, one atomic swap otherwise.
    #[inline]
    pub fn get(&mut self) -> &T {
        if !self.value.storage.is_empty() {
            self.value.storage.load(&mut self.cell);
        }
        // SAFETY: `self.cell` was issued by this value's storage
        unsafe { self.value.storage.get(&self.cell) }
    }

    /// Copy the latest value into `out`.
    #[inline]
    pub fn get_into(&mut self, out: &mut T)
    where
        T: Clone,
    {
        out.clone_from(self.get());
    }

    /// Whether the writer published a value the reader has not seen yet.
    #[inline]
    #[must_use]
    pub fn has_update(&self) -> bool {
        !self.value.storage.is_empty()
    }

    /// Whether the writer has been dropped.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.value) == 1
    }
}

impl<T> fmt::Debug for ValueReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueReader")
            .field("has_update", &self.has_update())
            .finish_non_exhaustive()
    }
}
