//! Scenarios for the lock-free family: one producer thread, one consumer thread.

use std::hint;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rt_exchange::lockfree::{AtomicValue, SingleElementQueue};
use rt_exchange::{Role, ThreadBound};

use super::{Clock, Frame, Pacer, Tally, join, spawn};
use crate::config::SoakConfig;
use crate::error::SoakError;
use crate::report::ScenarioReport;

fn warn_on_thread_counts(config: &SoakConfig) {
    if config.producers > 1 || config.consumers > 1 {
        tracing::warn!(
            producers = config.producers,
            consumers = config.consumers,
            "lock-free exchanges have exactly one producer and one consumer, ignoring thread counts"
        );
    }
}

pub fn run_queue(config: &SoakConfig) -> Result<ScenarioReport, SoakError> {
    rt_exchange::assert_lock_free()?;
    warn_on_thread_counts(config);

    let (producer, consumer) = SingleElementQueue::with_value(Frame::with_len(config.payload_len));
    let mut producer = ThreadBound::new(producer, Role::Producer);
    let mut consumer = ThreadBound::new(consumer, Role::Consumer);

    let iterations = config.iterations;
    let mut pacer = Pacer::new(config);
    let clock = Clock::start();
    let done = Arc::new(AtomicBool::new(false));

    let producer_done = Arc::clone(&done);
    let producer_handle = spawn("lockfree-producer".into(), move || {
        producer.try_get_mut()?;
        for seq in 1..=iterations {
            pacer.wait();
            let sent_ns = clock.now_ns();
            producer
                .get_mut()
                .update_and_push(|frame| frame.stamp(seq, sent_ns));
        }
        producer_done.store(true, Ordering::Release);
        Ok(producer.get_mut().overwritten())
    })?;

    let consumer_handle = spawn("lockfree-consumer".into(), move || {
        let consumer = consumer.try_get_mut()?;
        let mut tally = Tally::new()?;
        let mut last_seq = 0;
        loop {
            let finished = done.load(Ordering::Acquire);
            if let Some(frame) = consumer.pop() {
                tally.popped += 1;
                tally
                    .latency
                    .record(clock.now_ns().saturating_sub(frame.sent_ns()));
                if !frame.is_intact() || frame.seq() <= last_seq {
                    tally.corrupted += 1;
                }
                last_seq = frame.seq();
            } else if finished {
                break;
            } else {
                hint::spin_loop();
            }
        }
        Ok(tally)
    })?;

    let overwritten = join(producer_handle)?;
    let tally = join(consumer_handle)?;

    let mut report = ScenarioReport::new("lockfree-queue", 1, 1);
    report.pushed = iterations;
    report.popped = tally.popped;
    report.dropped = overwritten;
    // Each value is either delivered or replaced, anything else went missing
    report.corrupted = tally
        .corrupted
        .saturating_add(iterations.abs_diff(tally.popped.saturating_add(overwritten)));
    Ok(report.finish(clock.elapsed(), &tally.latency))
}

pub fn run_value(config: &SoakConfig) -> Result<ScenarioReport, SoakError> {
    rt_exchange::assert_lock_free()?;
    warn_on_thread_counts(config);

    let (writer, reader) = AtomicValue::new(Frame::with_len(config.payload_len));
    let mut writer = ThreadBound::new(writer, Role::Producer);
    let mut reader = ThreadBound::new(reader, Role::Consumer);

    let iterations = config.iterations;
    let mut pacer = Pacer::new(config);
    let clock = Clock::start();
    let done = Arc::new(AtomicBool::new(false));

    let writer_done = Arc::clone(&done);
    let writer_handle = spawn("lockfree-writer".into(), move || {
        writer.try_get_mut()?;
        for seq in 1..=iterations {
            pacer.wait();
            let sent_ns = clock.now_ns();
            writer.get_mut().update(|frame| frame.stamp(seq, sent_ns));
        }
        writer_done.store(true, Ordering::Release);
        Ok(())
    })?;

    let reader_handle = spawn("lockfree-reader".into(), move || {
        let reader = reader.try_get_mut()?;
        let mut tally = Tally::new()?;
        let mut last_seq = 0;
        loop {
            let finished = done.load(Ordering::Acquire);
            let frame = reader.get();
            if !frame.is_intact() || frame.seq() < last_seq {
                tally.corrupted += 1;
            }
            if frame.seq() != last_seq {
                tally.popped += 1;
                tally
                    .latency
                    .record(clock.now_ns().saturating_sub(frame.sent_ns()));
                last_seq = frame.seq();
            } else if finished {
                break;
            } else {
                hint::spin_loop();
            }
        }
        Ok((tally, last_seq))
    })?;

    join(writer_handle)?;
    let (tally, last_seq) = join(reader_handle)?;

    let mut report = ScenarioReport::new("lockfree-value", 1, 1);
    report.pushed = iterations;
    report.popped = tally.popped;
    report.dropped = iterations.saturating_sub(tally.popped);
    // The reader must end up on the final value
    report.corrupted = tally
        .corrupted
        .saturating_add(u64::from(last_seq != iterations));
    Ok(report.finish(clock.elapsed(), &tally.latency))
}
