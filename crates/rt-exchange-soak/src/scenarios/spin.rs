//! Scenarios for the spin lock family: any number of producers and consumers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use rt_exchange::SpinLock;
use rt_exchange::spin::{AtomicValue, SingleElementQueue};

use super::{Clock, Frame, Pacer, SeqTracker, Tally, join, spawn};
use crate::config::SoakConfig;
use crate::error::SoakError;
use crate::report::{Latency, ScenarioReport};

/// Spawn one producer per configured thread, each stamping `iterations` frames and
/// handing them to `publish`.
fn spawn_producers<F>(
    config: &SoakConfig,
    clock: Clock,
    remaining: &Arc<AtomicUsize>,
    publish: F,
) -> Result<Vec<thread::JoinHandle<Result<(), SoakError>>>, SoakError>
where
    F: Fn(&Frame) + Clone + Send + 'static,
{
    let iterations = config.iterations;
    (0..config.producers)
        .map(|producer| {
            let remaining = Arc::clone(remaining);
            let publish = publish.clone();
            let mut pacer = Pacer::new(config);
            let mut frame = Frame::with_len(config.payload_len);
            spawn(format!("spin-producer-{producer}"), move || {
                for i in 0..iterations {
                    pacer.wait();
                    frame.stamp(SeqTracker::seq(producer, iterations, i), clock.now_ns());
                    publish(&frame);
                }
                remaining.fetch_sub(1, Ordering::AcqRel);
                Ok(())
            })
        })
        .collect()
}

pub fn run_queue(config: &SoakConfig) -> Result<ScenarioReport, SoakError> {
    let queue = Arc::new(SingleElementQueue::with_storage(Frame::with_len(
        config.payload_len,
    )));
    let clock = Clock::start();
    let remaining = Arc::new(AtomicUsize::new(config.producers));

    let producers = {
        let queue = Arc::clone(&queue);
        spawn_producers(config, clock, &remaining, move |frame| queue.push(frame))?
    };

    let consumers = (0..config.consumers)
        .map(|consumer| {
            let queue = Arc::clone(&queue);
            let remaining = Arc::clone(&remaining);
            let mut tracker = SeqTracker::new(config.producers, config.iterations);
            let mut out = Frame::with_len(config.payload_len);
            spawn(format!("spin-consumer-{consumer}"), move || {
                let mut tally = Tally::new()?;
                loop {
                    let finished = remaining.load(Ordering::Acquire) == 0;
                    if queue.pop(&mut out) {
                        tally.popped += 1;
                        tally
                            .latency
                            .record(clock.now_ns().saturating_sub(out.sent_ns()));
                        if !out.is_intact() || !tracker.advance(out.seq()) {
                            tally.corrupted += 1;
                        }
                    } else if finished {
                        break;
                    } else {
                        thread::yield_now();
                    }
                }
                Ok(tally)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for handle in producers {
        join(handle)?;
    }
    let mut total = Tally::new()?;
    for handle in consumers {
        total.merge(&join(handle)?)?;
    }

    let pushed = config.iterations.saturating_mul(config.producers as u64);
    let mut report = ScenarioReport::new("spin-queue", config.producers, config.consumers);
    report.pushed = pushed;
    report.popped = total.popped;
    report.dropped = pushed.saturating_sub(total.popped);
    report.corrupted = total.corrupted;
    Ok(report.finish(clock.elapsed(), &total.latency))
}

pub fn run_value(config: &SoakConfig) -> Result<ScenarioReport, SoakError> {
    let value = Arc::new(AtomicValue::new(Frame::with_len(config.payload_len)));
    let clock = Clock::start();
    let remaining = Arc::new(AtomicUsize::new(config.producers));

    let writers = {
        let value = Arc::clone(&value);
        spawn_producers(config, clock, &remaining, move |frame| value.set(frame))?
    };

    let readers = (0..config.consumers)
        .map(|reader| {
            let value = Arc::clone(&value);
            let remaining = Arc::clone(&remaining);
            let mut tracker = SeqTracker::new(config.producers, config.iterations);
            let mut out = Frame::with_len(config.payload_len);
            spawn(format!("spin-reader-{reader}"), move || {
                let mut tally = Tally::new()?;
                let mut last_seq = 0;
                loop {
                    let finished = remaining.load(Ordering::Acquire) == 0;
                    value.get_into(&mut out);
                    if !out.is_intact() {
                        tally.corrupted += 1;
                    }
                    if out.seq() != last_seq {
                        tally.popped += 1;
                        tally
                            .latency
                            .record(clock.now_ns().saturating_sub(out.sent_ns()));
                        if !tracker.advance(out.seq()) {
                            tally.corrupted += 1;
                        }
                        last_seq = out.seq();
                    } else if finished {
                        break;
                    } else {
                        thread::yield_now();
                    }
                }
                Ok(tally)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for handle in writers {
        join(handle)?;
    }

    // Readers each see the register independently, report the busiest one
    let mut latency = Latency::new()?;
    let mut popped = 0;
    let mut corrupted = 0u64;
    for handle in readers {
        let tally = join(handle)?;
        popped = popped.max(tally.popped);
        corrupted = corrupted.saturating_add(tally.corrupted);
        latency.merge(&tally.latency)?;
    }

    let pushed = config.iterations.saturating_mul(config.producers as u64);
    let mut report = ScenarioReport::new("spin-value", config.producers, config.consumers);
    report.pushed = pushed;
    report.popped = popped;
    report.dropped = pushed.saturating_sub(popped);
    report.corrupted = corrupted;
    Ok(report.finish(clock.elapsed(), &latency))
}

/// Counter incremented with a separate load and store, so only the lock keeps
/// increments from getting lost.
struct Shared {
    lock: SpinLock,
    counter: AtomicU64,
}

pub fn run_lock(config: &SoakConfig) -> Result<ScenarioReport, SoakError> {
    let threads = config.producers.saturating_add(config.consumers);
    let iterations = config.iterations;
    let shared = Arc::new(Shared {
        lock: SpinLock::new(),
        counter: AtomicU64::new(0),
    });
    let clock = Clock::start();

    let handles = (0..threads)
        .map(|worker| {
            let shared = Arc::clone(&shared);
            spawn(format!("spin-lock-{worker}"), move || {
                let mut latency = Latency::new()?;
                for _ in 0..iterations {
                    let waiting = Instant::now();
                    let _guard = shared.lock.acquire();
                    latency.record(
                        u64::try_from(waiting.elapsed().as_nanos()).unwrap_or(u64::MAX),
                    );
                    let current = shared.counter.load(Ordering::Relaxed);
                    shared.counter.store(current.wrapping_add(1), Ordering::Relaxed);
                }
                Ok(latency)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut latency = Latency::new()?;
    for handle in handles {
        latency.merge(&join(handle)?)?;
    }

    let expected = iterations.saturating_mul(threads as u64);
    let counted = shared.counter.load(Ordering::Relaxed);
    if shared.lock.is_locked() {
        tracing::error!("spin lock still held after all workers finished");
    }

    let mut report = ScenarioReport::new("spin-lock", threads, 0);
    report.pushed = expected;
    report.popped = counted;
    report.corrupted = expected
        .abs_diff(counted)
        .saturating_add(u64::from(shared.lock.is_locked()));
    Ok(report.finish(clock.elapsed(), &latency))
}
