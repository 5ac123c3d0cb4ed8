//! Unit tests for rt-exchange.
//!
//! These tests cover the public API of every exchange type from a single thread.

use rt_exchange::prelude::*;
use rt_exchange::{assert_lock_free, lockfree, spin};
use rt_exchange_test_helpers::prelude::TestResult;
use rt_exchange_test_helpers::{Tracked, must, must_some, must_with};

#[test]
fn test_assert_lock_free_on_host() -> TestResult {
    assert!(lockfree::is_lock_free());
    assert!(LockFreeQueue::<u8>::is_lock_free());
    assert!(LockFreeValue::<u8>::is_lock_free());
    assert_lock_free()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Lock-free queue
// ---------------------------------------------------------------------------

#[test]
fn test_lockfree_queue_round_trip() {
    let (mut producer, mut consumer) = LockFreeQueue::<u64>::new();

    producer.push(&17);
    assert_eq!(consumer.pop(), Some(&17));
    assert_eq!(consumer.pop(), None);
}

#[test]
fn test_lockfree_queue_last_write_wins() {
    let (mut producer, mut consumer) = LockFreeQueue::<u64>::new();

    for v in 1..=5 {
        producer.push(&v);
    }
    assert_eq!(consumer.pop(), Some(&5));
    assert_eq!(consumer.pop(), None);
    assert_eq!(producer.overwritten(), 4);
}

#[test]
fn test_lockfree_queue_last_before_first_pop_is_initial_value() {
    let (mut producer, mut consumer) = LockFreeQueue::with_value(-1i32);
    assert_eq!(*consumer.last(), -1);

    producer.push(&3);
    // `last` never consumes
    assert_eq!(*consumer.last(), -1);
    assert!(consumer.has_update());
    assert_eq!(*consumer.pop_or_last(), 3);
    assert_eq!(*consumer.last(), 3);
}

#[test]
fn test_lockfree_queue_pop_or_last_is_stable() {
    let (mut producer, mut consumer) = LockFreeQueue::<u8>::new();

    producer.push(&9);
    let first = *consumer.pop_or_last();
    for _ in 0..10 {
        assert_eq!(*consumer.pop_or_last(), first);
    }
}

#[test]
fn test_lockfree_queue_pop_into_leaves_out_untouched_when_empty() {
    let (mut producer, mut consumer) = LockFreeQueue::<String>::new();

    let mut out = String::from("untouched");
    assert!(!consumer.pop_into(&mut out));
    assert_eq!(out, "untouched");

    producer.push(&String::from("fresh"));
    assert!(consumer.pop_into(&mut out));
    assert_eq!(out, "fresh");
}

#[test]
fn test_lockfree_queue_update_and_push_writes_private_cell() {
    let (mut producer, mut consumer) = LockFreeQueue::<Vec<f32>>::with_value(vec![0.0; 8]);

    producer.update_and_push(|block| block.fill(0.25));
    let block = must_some(consumer.pop(), "block was pushed");
    assert_eq!(block.len(), 8);
    assert!(block.iter().all(|s| (*s - 0.25).abs() < f32::EPSILON));
}

#[test]
fn test_lockfree_queue_update_and_push_if_skips_publish() {
    let (mut producer, mut consumer) = LockFreeQueue::<u32>::new();

    assert!(!producer.update_and_push_if(|v| {
        *v = 100;
        false
    }));
    assert!(!producer.has_pending());
    assert_eq!(consumer.pop(), None);
}

#[test]
fn test_lockfree_queue_abandoned() {
    let (producer, consumer) = LockFreeQueue::<u8>::new();
    assert!(!producer.is_abandoned());
    drop(consumer);
    assert!(producer.is_abandoned());
}

#[test]
fn test_lockfree_queue_drops_every_cell() {
    Tracked::reset_counters();
    {
        let (mut producer, mut consumer) = LockFreeQueue::<Tracked>::new();
        producer.push(&Tracked::new(1));
        assert_eq!(consumer.pop().map(Tracked::seq), Some(1));
    }
    assert_eq!(Tracked::counters().live(), 0);
}

// ---------------------------------------------------------------------------
// Lock-free value
// ---------------------------------------------------------------------------

#[test]
fn test_lockfree_value_reads_latest() {
    let (mut writer, mut reader) = LockFreeValue::new(0u16);
    assert_eq!(*reader.get(), 0);

    writer.set(&1);
    writer.set(&2);
    assert_eq!(*reader.get(), 2);
    assert_eq!(*reader.get(), 2);
}

#[test]
fn test_lockfree_value_update_if() {
    let (mut writer, mut reader) = LockFreeValue::<(u8, bool)>::with_default();

    assert!(writer.update_if(|v| {
        *v = (1, true);
        true
    }));
    assert!(reader.has_update());
    assert_eq!(*reader.get(), (1, true));
    assert!(!reader.has_update());
}

// ---------------------------------------------------------------------------
// Spin lock family
// ---------------------------------------------------------------------------

#[test]
fn test_spin_queue_round_trip_and_last_write_wins() {
    let queue = SpinQueue::<u32>::new();
    let mut out = 0;

    queue.push(&1);
    queue.push(&2);
    assert!(queue.pop(&mut out));
    assert_eq!(out, 2);
    assert!(!queue.pop(&mut out));
    assert_eq!(out, 2);
}

#[test]
fn test_spin_queue_with_element_and_storage() {
    let pending = spin::SingleElementQueue::with_element(5u8);
    assert!(!pending.is_empty());
    assert_eq!(pending.pop_value(), Some(5));

    let empty = spin::SingleElementQueue::with_storage(5u8);
    assert!(empty.is_empty());
    assert_eq!(empty.pop_value(), None);
}

#[test]
fn test_spin_value_get_set_update() {
    let value = SpinValue::new(String::from("a"));
    value.set(&String::from("b"));
    value.update(|s| s.push('c'));

    let mut out = String::new();
    value.get_into(&mut out);
    assert_eq!(out, "bc");
    assert_eq!(value.get(), "bc");
}

#[test]
fn test_spin_lock_guard_scopes_lock() {
    let lock = SpinLock::new();
    {
        let _guard = lock.acquire();
        assert!(lock.is_locked());
        assert!(lock.try_acquire().is_none());
    }
    assert!(!lock.is_locked());
    let guard = must_some(lock.try_acquire(), "lock is free");
    drop(guard);
}

// ---------------------------------------------------------------------------
// Thread roles
// ---------------------------------------------------------------------------

#[test]
fn test_thread_bound_handle_on_owner_thread() {
    let (producer, consumer) = LockFreeQueue::<u8>::new();
    let mut producer = ThreadBound::new(producer, Role::Producer);
    let mut consumer = ThreadBound::new(consumer, Role::Consumer);

    must(producer.try_get_mut()).push(&4);
    assert_eq!(
        must_with(consumer.try_get_mut(), "first access binds the consumer").pop(),
        Some(&4)
    );
    assert_eq!(producer.role(), Role::Producer);
}

#[test]
fn test_role_violation_reports_role() {
    let (producer, _consumer) = LockFreeQueue::<u8>::new();
    let mut producer = ThreadBound::new(producer, Role::Producer);
    must(producer.try_get_mut()).push(&1);

    let handle = std::thread::spawn(move || producer.try_get_mut().map(|_| ()));
    let err = match handle.join() {
        Ok(Err(err)) => err,
        Ok(Ok(())) => panic!("access from a second thread must fail"),
        Err(_) => panic!("thread panicked unexpectedly"),
    };
    assert!(err.is_role_violation());
    assert_eq!(err.role(), Some(Role::Producer));
    assert!(matches!(err, ExchangeError::RoleViolation { .. }));
}
