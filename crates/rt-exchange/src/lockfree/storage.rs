//! Three-cell storage with atomic ownership transfer.
//!
//! The storage owns three pre-allocated cells. At any instant each cell is owned by
//! exactly one of: the shared slot, the push side or the pop side. The shared slot is a
//! single atomic byte holding the index of the cell it owns plus a `FRESH` bit meaning
//! "written by the push side, not yet taken by the pop side". Handing a cell over is one
//! atomic swap of that byte.
//!
//! Each side proves ownership of its cell with a [`CellToken`]. Tokens are created only
//! by [`SingleElementStorage::new`] and are neither `Clone` nor `Copy`, so a cell index
//! can never be held twice.

#![expect(
    unsafe_code,
    reason = "cells are shared through UnsafeCell, ownership is tracked by CellToken"
)]

use core::cell::UnsafeCell;
use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use crossbeam::utils::CachePadded;

/// Bit 0 of the slot tag: the cell in the slot holds an unconsumed value.
const FRESH: u8 = 1;

/// Cell owned by the shared slot at construction.
const INITIAL_SLOT_INDEX: u8 = 1;

/// Ownership of one of the three cells of a [`SingleElementStorage`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CellToken {
    index: u8,
    fresh: bool,
}

impl CellToken {
    #[inline]
    fn from_tag(tag: u8) -> Self {
        Self {
            index: tag >> 1,
            fresh: tag & FRESH != 0,
        }
    }

    #[inline]
    fn tag(&self, fresh: bool) -> u8 {
        (self.index << 1) | u8::from(fresh)
    }

    /// Whether the cell left the slot with an unconsumed value in it.
    #[inline]
    pub(crate) fn is_fresh(&self) -> bool {
        self.fresh
    }
}

/// Lock-free storage exchanging cells between one push side and one pop side.
///
/// `store` and `load` exchange the caller's token with the one held by the slot, so a
/// token always names the cell its holder owns right now.
///
/// # Thread Safety
///
/// [`store`](Self::store) and [`load`](Self::load) are single atomic swaps with
/// `AcqRel` ordering. Writes made by the push side to its cell happen-before the pop
/// side reads that cell after taking it, and reads made by the pop side happen-before
/// the push side writes to a cell the pop side gave back.
///
/// Only one thread may call `store` and only one thread may call `load`. The wrappers
/// in this module enforce that by owning the tokens inside non-`Clone` handles whose
/// operations take `&mut self`.
pub(crate) struct SingleElementStorage<T> {
    slot: CachePadded<AtomicU8>,
    cells: [UnsafeCell<T>; 3],
}

// SAFETY: every cell is accessed only by the holder of its token, and tokens move
// between threads only through the AcqRel swaps on `slot`. Values of `T` are handed
// from one thread to another, which requires `T: Send` but never shared access.
unsafe impl<T: Send> Sync for SingleElementStorage<T> {}

impl<T> SingleElementStorage<T> {
    /// Build the storage from three initial cell values.
    ///
    /// Returns the storage with the push side token and the pop side token. The
    /// shared slot starts out owning the middle cell, not fresh.
    pub(crate) fn new(cells: [T; 3]) -> (Self, CellToken, CellToken) {
        let storage = Self {
            slot: CachePadded::new(AtomicU8::new(INITIAL_SLOT_INDEX << 1)),
            cells: cells.map(UnsafeCell::new),
        };
        let push = CellToken {
            index: 0,
            fresh: false,
        };
        let pop = CellToken {
            index: 2,
            fresh: false,
        };
        (storage, push, pop)
    }

    /// Whether the value owned by the slot has already been consumed.
    ///
    /// Relaxed: only the pop side clears `FRESH`, so from the pop side's point of view
    /// a `false` answer stays valid until its own next `load`.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.slot.load(Ordering::Relaxed) & FRESH == 0
    }

    /// Publish the push side cell as fresh. On return `token` owns the displaced cell.
    ///
    /// A displaced cell that is still fresh carries a value the pop side never saw.
    #[inline]
    pub(crate) fn store(&self, token: &mut CellToken) {
        *token = CellToken::from_tag(self.slot.swap(token.tag(true), Ordering::AcqRel));
    }

    /// Give back the pop side cell marked consumed. On return `token` owns the
    /// displaced cell, fresh if it carries a value the pop side has not seen yet.
    #[inline]
    pub(crate) fn load(&self, token: &mut CellToken) {
        *token = CellToken::from_tag(self.slot.swap(token.tag(false), Ordering::AcqRel));
    }

    #[inline]
    fn cell(&self, index: u8) -> &UnsafeCell<T> {
        let [first, second, third] = &self.cells;
        match index {
            0 => first,
            1 => second,
            _ => third,
        }
    }

    /// Shared access to the cell owned by `token`.
    ///
    /// # Safety
    ///
    /// `token` must have been returned by this storage (from `new`, `store` or `load`).
    #[inline]
    pub(crate) unsafe fn get<'a>(&'a self, token: &'a CellToken) -> &'a T {
        // SAFETY: the caller guarantees the token belongs to this storage, so the token
        // holder is the only party allowed to touch this cell.
        unsafe { &*self.cell(token.index).get() }
    }

    /// Exclusive access to the cell owned by `token`.
    ///
    /// # Safety
    ///
    /// `token` must have been returned by this storage (from `new`, `store` or `load`).
    #[inline]
    pub(crate) unsafe fn get_mut<'a>(&'a self, token: &'a mut CellToken) -> &'a mut T {
        // SAFETY: the caller guarantees the token belongs to this storage. Tokens are
        // unique and borrowed mutably here, so no other reference to the cell exists.
        unsafe { &mut *self.cell(token.index).get() }
    }
}

impl<T> fmt::Debug for SingleElementStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.slot.load(Ordering::Relaxed);
        f.debug_struct("SingleElementStorage")
            .field("slot_index", &(tag >> 1))
            .field("fresh", &(tag & FRESH != 0))
            .finish_non_exhaustive()
    }
}
