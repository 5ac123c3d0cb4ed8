//! A payload that counts its copies and detects torn ones.
//!
//! [`Tracked`] carries a sequence number repeated across several words. A copy that
//! interleaves with another write shows mixed words and fails [`Tracked::is_intact`].
//! Copies are written word by word on purpose, so an unguarded concurrent copy
//! actually has a window to tear.
//!
//! Clone and `clone_from` calls are counted in plain thread-local counters. Read them
//! with [`Tracked::counters`] on the thread that made the copies.

use std::cell::Cell;
use std::fmt;

/// Number of words in a [`Tracked`] payload.
pub const TRACKED_WORDS: usize = 16;

thread_local! {
    static CREATED: Cell<u64> = const { Cell::new(0) };
    static CLONES: Cell<u64> = const { Cell::new(0) };
    static CLONE_FROMS: Cell<u64> = const { Cell::new(0) };
    static DROPS: Cell<u64> = const { Cell::new(0) };
}

fn bump(counter: &'static std::thread::LocalKey<Cell<u64>>) {
    counter.with(|c| c.set(c.get().wrapping_add(1)));
}

/// Per-thread copy counters of [`Tracked`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackedCounters {
    /// Values created with [`Tracked::new`] or `default`
    pub created: u64,
    /// `clone` calls
    pub clones: u64,
    /// `clone_from` calls
    pub clone_froms: u64,
    /// Values dropped
    pub drops: u64,
}

impl TrackedCounters {
    /// Instances created on this thread minus instances dropped on it.
    pub fn live(&self) -> i64 {
        let born = self.created.wrapping_add(self.clones);
        born.wrapping_sub(self.drops) as i64
    }
}

/// Test payload with a sequence number and a torn-copy check.
pub struct Tracked {
    seq: u64,
    words: [u64; TRACKED_WORDS],
}

impl Tracked {
    /// Create a payload whose every word encodes `seq`.
    pub fn new(seq: u64) -> Self {
        bump(&CREATED);
        Self {
            seq,
            words: [seq; TRACKED_WORDS],
        }
    }

    /// Sequence number the payload was created with.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether every word agrees with the sequence number.
    pub fn is_intact(&self) -> bool {
        self.words.iter().all(|w| *w == self.seq)
    }

    /// Counters of the current thread.
    pub fn counters() -> TrackedCounters {
        TrackedCounters {
            created: CREATED.with(Cell::get),
            clones: CLONES.with(Cell::get),
            clone_froms: CLONE_FROMS.with(Cell::get),
            drops: DROPS.with(Cell::get),
        }
    }

    /// Zero the counters of the current thread.
    pub fn reset_counters() {
        for counter in [&CREATED, &CLONES, &CLONE_FROMS, &DROPS] {
            counter.with(|c| c.set(0));
        }
    }
}

impl Default for Tracked {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        bump(&CLONES);
        Self {
            seq: self.seq,
            words: self.words,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        bump(&CLONE_FROMS);
        for (dst, src) in self.words.iter_mut().zip(source.words.iter()) {
            // black_box keeps the copy from being merged into one memcpy
            *dst = std::hint::black_box(*src);
        }
        self.seq = source.seq;
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        bump(&DROPS);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq && self.words == other.words
    }
}

impl Eq for Tracked {}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("seq", &self.seq)
            .field("intact", &self.is_intact())
            .finish()
    }
}
