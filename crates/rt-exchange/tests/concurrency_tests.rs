//! Concurrency tests for rt-exchange.
//!
//! These tests run producers and consumers on real threads and check what the
//! consumers observe: no torn values, no value seen twice, nothing invented.

use std::cell::UnsafeCell;
use std::hint;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use rt_exchange::{Role, SpinLock, ThreadBound, lockfree, spin};
use rt_exchange_test_helpers::{
    Tracked, assert_all_within, assert_intact, assert_monotonic, must, must_join,
};

const SPSC_ITERATIONS: u64 = 50_000;

#[test]
fn test_lockfree_queue_spsc_delivers_increasing_intact_values() {
    let (mut producer, mut consumer) = lockfree::SingleElementQueue::<Tracked>::new();

    let producer_handle = thread::spawn(move || {
        for seq in 1..=SPSC_ITERATIONS {
            producer.push(&Tracked::new(seq));
        }
        producer.overwritten()
    });

    let consumer_handle = thread::spawn(move || {
        let mut seen = Vec::new();
        loop {
            match consumer.pop() {
                Some(value) => {
                    assert_intact!(value);
                    seen.push(value.seq());
                    if value.seq() == SPSC_ITERATIONS {
                        break;
                    }
                }
                None => hint::spin_loop(),
            }
        }
        seen
    });

    let overwritten = must_join(producer_handle);
    let seen = must_join(consumer_handle);

    assert_monotonic!(&seen);
    assert_all_within!(&seen, 1..=SPSC_ITERATIONS);
    assert_eq!(seen.last(), Some(&SPSC_ITERATIONS));
    // Every push was either delivered or counted as overwritten
    assert_eq!(seen.len() as u64 + overwritten, SPSC_ITERATIONS);
}

#[test]
fn test_lockfree_queue_pop_into_across_threads() {
    let (mut producer, mut consumer) = lockfree::SingleElementQueue::<u64>::new();
    let done = Arc::new(AtomicBool::new(false));

    let producer_done = Arc::clone(&done);
    let producer_handle = thread::spawn(move || {
        for v in 1..=SPSC_ITERATIONS {
            producer.push(&v);
        }
        producer_done.store(true, Ordering::Release);
    });

    let mut last = 0;
    let mut out = 0;
    loop {
        let finished = done.load(Ordering::Acquire);
        if consumer.pop_into(&mut out) {
            assert!(out > last, "value went backwards: {out} after {last}");
            last = out;
        } else if finished {
            break;
        }
    }

    assert!(producer_handle.join().is_ok(), "thread panicked unexpectedly");
    assert_eq!(last, SPSC_ITERATIONS);
    assert!(consumer.is_abandoned());
}

#[test]
fn test_lockfree_value_reader_never_goes_backwards() {
    let (mut writer, mut reader) = lockfree::AtomicValue::new(Tracked::new(0));

    let writer_handle = thread::spawn(move || {
        for seq in 1..=SPSC_ITERATIONS {
            writer.set(&Tracked::new(seq));
        }
    });

    let mut last = 0;
    while last < SPSC_ITERATIONS {
        let value = reader.get();
        assert_intact!(value);
        assert!(value.seq() >= last);
        last = value.seq();
    }

    assert!(writer_handle.join().is_ok(), "thread panicked unexpectedly");
}

#[test]
fn test_lockfree_value_observes_set_after_barrier() {
    let (mut writer, mut reader) = lockfree::AtomicValue::new(0i32);
    let barrier = Arc::new(Barrier::new(2));

    let writer_barrier = Arc::clone(&barrier);
    let writer_handle = thread::spawn(move || {
        writer.set(&42);
        writer_barrier.wait();
    });

    barrier.wait();
    assert_eq!(*reader.get(), 42);
    assert!(writer_handle.join().is_ok(), "thread panicked unexpectedly");
}

#[test]
fn test_spin_value_observes_set_after_barrier() {
    let value = Arc::new(spin::AtomicValue::new(0i32));
    let barrier = Arc::new(Barrier::new(2));

    let writer = {
        let value = Arc::clone(&value);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            value.set(&42);
            barrier.wait();
        })
    };

    let reader = {
        let value = Arc::clone(&value);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            value.get()
        })
    };

    assert!(writer.join().is_ok(), "thread panicked unexpectedly");
    assert_eq!(must_join(reader), 42);
}

#[test]
fn test_spin_queue_many_producers_many_consumers() {
    const PRODUCERS: u64 = 4;
    const CONSUMERS: usize = 3;
    const PER_PRODUCER: u64 = 10_000;

    let queue = Arc::new(spin::SingleElementQueue::<Tracked>::new());
    let producers_left = Arc::new(AtomicU64::new(PRODUCERS));

    let producer_handles: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let queue = Arc::clone(&queue);
            let producers_left = Arc::clone(&producers_left);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.push(&Tracked::new(producer * PER_PRODUCER + i));
                }
                producers_left.fetch_sub(1, Ordering::AcqRel);
            })
        })
        .collect();

    let consumer_handles: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let producers_left = Arc::clone(&producers_left);
            thread::spawn(move || {
                let mut by_producer = vec![Vec::new(); PRODUCERS as usize];
                let mut out = Tracked::default();
                loop {
                    let finished = producers_left.load(Ordering::Acquire) == 0;
                    if queue.pop(&mut out) {
                        assert_intact!(out);
                        let producer = (out.seq() / PER_PRODUCER) as usize;
                        if let Some(seen) = by_producer.get_mut(producer) {
                            seen.push(out.seq());
                        }
                    } else if finished {
                        break;
                    } else {
                        thread::yield_now();
                    }
                }
                by_producer
            })
        })
        .collect();

    for handle in producer_handles {
        assert!(handle.join().is_ok(), "thread panicked unexpectedly");
    }

    let mut total = 0;
    for handle in consumer_handles {
        for seen in must_join(handle) {
            assert_monotonic!(&seen);
            assert_all_within!(&seen, 0..PRODUCERS * PER_PRODUCER);
            total += seen.len() as u64;
        }
    }

    assert!(total > 0);
    assert!(total <= PRODUCERS * PER_PRODUCER);
    assert!(queue.is_empty());
}

/// Plain `u64` that is only touched while `lock` is held.
struct LockedCounter {
    lock: SpinLock,
    count: UnsafeCell<u64>,
}

// SAFETY: `count` is only read or written while holding a guard from `lock`.
#[expect(unsafe_code, reason = "counter shared between threads under the spin lock")]
unsafe impl Sync for LockedCounter {}

impl LockedCounter {
    #[expect(unsafe_code, reason = "counter shared between threads under the spin lock")]
    fn increment(&self) {
        let _guard = self.lock.acquire();
        // SAFETY: the guard is alive for the whole read-modify-write, no other thread
        // can reach `count` until it drops.
        unsafe { *self.count.get() += 1 };
    }

    #[expect(unsafe_code, reason = "counter shared between threads under the spin lock")]
    fn get(&self) -> u64 {
        let _guard = self.lock.acquire();
        // SAFETY: as in `increment`, the guard excludes every writer.
        unsafe { *self.count.get() }
    }
}

#[test]
fn test_spin_lock_protects_non_atomic_increment() {
    const THREADS: u64 = 2;
    const INCREMENTS: u64 = 100_000;

    let shared = Arc::new(LockedCounter {
        lock: SpinLock::new(),
        count: UnsafeCell::new(0),
    });

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..INCREMENTS {
                    shared.increment();
                }
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().is_ok(), "thread panicked unexpectedly");
    }

    assert_eq!(shared.get(), THREADS * INCREMENTS);
    assert!(!shared.lock.is_locked());
}

#[test]
fn test_spin_value_copies_are_never_torn() {
    const THREADS: u64 = 4;
    const OPS: u64 = 20_000;

    let value = Arc::new(spin::AtomicValue::new(Tracked::new(0)));

    let handles: Vec<_> = (0..THREADS)
        .map(|thread_id| {
            let value = Arc::clone(&value);
            thread::spawn(move || {
                Tracked::reset_counters();
                let mut out = Tracked::default();
                let mut writes = 0;
                for i in 0..OPS {
                    if i % 2 == 0 {
                        value.set(&Tracked::new(thread_id * OPS + i));
                        writes += 1;
                    } else {
                        value.get_into(&mut out);
                        assert_intact!(out);
                    }
                }
                (writes, Tracked::counters())
            })
        })
        .collect();

    for handle in handles {
        let (writes, counters) = must_join(handle);
        // One clone_from per set and per get_into, never a clone
        assert_eq!(counters.clone_froms, OPS);
        assert_eq!(counters.clones, 0);
        assert_eq!(writes, OPS / 2);
    }

    value.update(|v| assert!(v.is_intact()));
}

#[test]
fn test_spin_value_update_is_atomic() {
    const THREADS: u64 = 4;
    const INCREMENTS: u64 = 25_000;

    let value = Arc::new(spin::AtomicValue::new(0u64));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let value = Arc::clone(&value);
            thread::spawn(move || {
                for _ in 0..INCREMENTS {
                    value.update(|v| *v += 1);
                }
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().is_ok(), "thread panicked unexpectedly");
    }

    assert_eq!(value.get(), THREADS * INCREMENTS);
}

#[test]
fn test_thread_bound_handles_on_dedicated_threads() {
    let (producer, consumer) = lockfree::SingleElementQueue::<u32>::new();
    let mut producer = ThreadBound::new(producer, Role::Producer);
    let mut consumer = ThreadBound::new(consumer, Role::Consumer);

    let producer_handle = thread::spawn(move || -> rt_exchange::Result<()> {
        for v in 1..=1_000 {
            producer.try_get_mut()?.push(&v);
        }
        Ok(())
    });

    let consumer_handle = thread::spawn(move || -> rt_exchange::Result<u32> {
        loop {
            let queue = consumer.try_get_mut()?;
            if let Some(&v) = queue.pop() {
                if v == 1_000 {
                    return Ok(v);
                }
            } else if queue.is_abandoned() && !queue.has_update() {
                return Ok(*queue.last());
            }
        }
    });

    must(must_join(producer_handle));
    assert_eq!(must(must_join(consumer_handle)), 1_000);
}
