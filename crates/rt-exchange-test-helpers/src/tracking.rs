//! Allocation tracking for RT safety tests.
//!
//! Counting is per thread: a guard only sees allocations made by the thread that
//! created it, so concurrent tests in the same binary do not disturb each other.
//!
//! Install the allocator in the test binary:
//!
//! ```rust,ignore
//! use rt_exchange_test_helpers::tracking::TrackingAllocator;
//!
//! #[global_allocator]
//! static GLOBAL: TrackingAllocator = TrackingAllocator;
//! ```

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

thread_local! {
    static ALLOCATION_COUNT: Cell<usize> = const { Cell::new(0) };
    static ALLOCATION_BYTES: Cell<usize> = const { Cell::new(0) };
    static TRACKING_DEPTH: Cell<usize> = const { Cell::new(0) };
}

fn tracking_enabled() -> bool {
    TRACKING_DEPTH.with(|depth| depth.get() > 0)
}

fn record(bytes: usize) {
    ALLOCATION_COUNT.with(|count| count.set(count.get().saturating_add(1)));
    ALLOCATION_BYTES.with(|total| total.set(total.get().saturating_add(bytes)));
}

/// Global allocator that forwards to [`System`] and counts allocations made while a
/// [`track`] guard is alive on the current thread.
#[derive(Debug)]
pub struct TrackingAllocator;

// SAFETY: every call is forwarded unchanged to `System`, the bookkeeping only touches
// thread-local `Cell`s with `const` initializers, which never allocate.
unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded with the caller's layout
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() && tracking_enabled() {
            record(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded with the caller's layout
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() && tracking_enabled() {
            record(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: `ptr` was allocated by `System` with `layout`
        unsafe { System.dealloc(ptr, layout) };
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // SAFETY: `ptr` was allocated by `System` with `layout`
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() && tracking_enabled() && new_size > layout.size() {
            record(new_size - layout.size());
        }
        new_ptr
    }
}

/// Measures allocations on the current thread from its creation on.
#[derive(Debug)]
pub struct AllocationGuard {
    start_count: usize,
    start_bytes: usize,
}

impl AllocationGuard {
    /// Start tracking on the current thread.
    pub fn new() -> Self {
        TRACKING_DEPTH.with(|depth| depth.set(depth.get().saturating_add(1)));
        Self {
            start_count: ALLOCATION_COUNT.with(Cell::get),
            start_bytes: ALLOCATION_BYTES.with(Cell::get),
        }
    }

    /// Number of allocations since the guard was created.
    pub fn allocations(&self) -> usize {
        ALLOCATION_COUNT
            .with(Cell::get)
            .saturating_sub(self.start_count)
    }

    /// Number of bytes allocated since the guard was created.
    pub fn bytes(&self) -> usize {
        ALLOCATION_BYTES
            .with(Cell::get)
            .saturating_sub(self.start_bytes)
    }

    /// Whether anything was allocated since the guard was created.
    pub fn has_allocations(&self) -> bool {
        self.allocations() > 0
    }
}

impl Default for AllocationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AllocationGuard {
    fn drop(&mut self) {
        TRACKING_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Start tracking allocations on the current thread.
pub fn track() -> AllocationGuard {
    AllocationGuard::new()
}

/// Panic if the guard saw any allocation.
#[macro_export]
macro_rules! assert_rt_safe {
    ($guard:expr) => {
        let _guard = &$guard;
        let allocs = _guard.allocations();
        let bytes = _guard.bytes();
        if allocs > 0 {
            panic!(
                "RT path allocation violation: {} allocations ({} bytes)\n\
                 Location: {}:{}",
                allocs,
                bytes,
                file!(),
                line!()
            );
        }
    };
    ($guard:expr, $context:expr) => {
        let _guard = &$guard;
        let allocs = _guard.allocations();
        let bytes = _guard.bytes();
        if allocs > 0 {
            panic!(
                "RT path allocation violation in '{}': {} allocations ({} bytes)\n\
                 Location: {}:{}",
                $context,
                allocs,
                bytes,
                file!(),
                line!()
            );
        }
    };
}
