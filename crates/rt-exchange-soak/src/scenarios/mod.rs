//! Soak scenarios, one per exchange type.
//!
//! Every scenario pushes stamped [`Frame`]s through an exchange from producer threads
//! and checks what the consumer threads observe. A frame is corrupted when its samples
//! disagree with its sequence number (a torn copy) or when a consumer sees a producer's
//! sequence numbers go backwards.

mod lockfree;
mod spin;

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::SoakConfig;
use crate::error::SoakError;
use crate::report::{Latency, ScenarioReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    LockfreeQueue,
    LockfreeValue,
    SpinQueue,
    SpinValue,
    SpinLock,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::LockfreeQueue,
        Scenario::LockfreeValue,
        Scenario::SpinQueue,
        Scenario::SpinValue,
        Scenario::SpinLock,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::LockfreeQueue => "lockfree-queue",
            Scenario::LockfreeValue => "lockfree-value",
            Scenario::SpinQueue => "spin-queue",
            Scenario::SpinValue => "spin-value",
            Scenario::SpinLock => "spin-lock",
        }
    }

    pub fn run(self, config: &SoakConfig) -> Result<ScenarioReport, SoakError> {
        tracing::info!(
            scenario = self.name(),
            iterations = config.iterations,
            payload_len = config.payload_len,
            "starting scenario"
        );
        let report = match self {
            Scenario::LockfreeQueue => lockfree::run_queue(config),
            Scenario::LockfreeValue => lockfree::run_value(config),
            Scenario::SpinQueue => spin::run_queue(config),
            Scenario::SpinValue => spin::run_value(config),
            Scenario::SpinLock => spin::run_lock(config),
        }?;
        tracing::info!(
            scenario = self.name(),
            pushed = report.pushed,
            popped = report.popped,
            dropped = report.dropped,
            corrupted = report.corrupted,
            elapsed_ms = report.elapsed_ms,
            "scenario finished"
        );
        Ok(report)
    }
}

/// Value pushed through the exchanges: a sequence number, a send timestamp and a
/// payload whose every word repeats the sequence number.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Frame {
    seq: u64,
    sent_ns: u64,
    samples: Vec<u64>,
}

impl Frame {
    pub fn with_len(len: usize) -> Self {
        Self {
            seq: 0,
            sent_ns: 0,
            samples: vec![0; len],
        }
    }

    /// Overwrite every field, whatever the frame held before.
    #[inline]
    pub fn stamp(&mut self, seq: u64, sent_ns: u64) {
        self.seq = seq;
        self.sent_ns = sent_ns;
        self.samples.fill(seq);
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn sent_ns(&self) -> u64 {
        self.sent_ns
    }

    pub fn is_intact(&self) -> bool {
        self.samples.iter().all(|s| *s == self.seq)
    }
}

impl Clone for Frame {
    fn clone(&self) -> Self {
        Self {
            seq: self.seq,
            sent_ns: self.sent_ns,
            samples: self.samples.clone(),
        }
    }

    // Reuses the sample buffer, so copies on the producer side never allocate
    fn clone_from(&mut self, source: &Self) {
        self.seq = source.seq;
        self.sent_ns = source.sent_ns;
        self.samples.clone_from(&source.samples);
    }
}

/// Monotonic time since the start of a scenario.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn now_ns(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Sleeps a producer until its next simulated audio callback.
#[derive(Debug)]
pub struct Pacer {
    period: Option<Duration>,
    next: Instant,
}

impl Pacer {
    pub fn new(config: &SoakConfig) -> Self {
        Self {
            period: config.pace.then(|| config.callback_period()),
            next: Instant::now(),
        }
    }

    #[inline]
    pub fn wait(&mut self) {
        if let Some(period) = self.period {
            self.next += period;
            let now = Instant::now();
            if self.next > now {
                thread::sleep(self.next - now);
            }
        }
    }
}

/// What one consumer thread saw.
#[derive(Debug)]
pub struct Tally {
    pub popped: u64,
    pub corrupted: u64,
    pub latency: Latency,
}

impl Tally {
    pub fn new() -> Result<Self, SoakError> {
        Ok(Self {
            popped: 0,
            corrupted: 0,
            latency: Latency::new()?,
        })
    }

    pub fn merge(&mut self, other: &Tally) -> Result<(), SoakError> {
        self.popped = self.popped.saturating_add(other.popped);
        self.corrupted = self.corrupted.saturating_add(other.corrupted);
        self.latency.merge(&other.latency)
    }
}

/// Tracks the last sequence number seen from each producer.
///
/// Sequence numbers are `producer * iterations + i + 1`, so the producer is
/// recoverable from the value alone.
#[derive(Debug)]
pub struct SeqTracker {
    iterations: u64,
    last: Vec<u64>,
}

impl SeqTracker {
    pub fn new(producers: usize, iterations: u64) -> Self {
        Self {
            iterations,
            last: vec![0; producers],
        }
    }

    /// Sequence number for the `i`-th value (from zero) of `producer`.
    pub fn seq(producer: usize, iterations: u64, i: u64) -> u64 {
        (producer as u64)
            .saturating_mul(iterations)
            .saturating_add(i)
            .saturating_add(1)
    }

    /// Record `seq`, returning `false` if it does not move its producer forward.
    pub fn advance(&mut self, seq: u64) -> bool {
        let producer = usize::try_from(seq.saturating_sub(1) / self.iterations.max(1));
        match producer.ok().and_then(|p| self.last.get_mut(p)) {
            Some(last) if seq > *last => {
                *last = seq;
                true
            }
            _ => false,
        }
    }
}

/// Join a worker thread, turning a panic into an error.
pub fn join<T>(handle: JoinHandle<Result<T, SoakError>>) -> Result<T, SoakError> {
    let name = handle.thread().name().unwrap_or("worker").to_owned();
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(SoakError::WorkerPanicked(name)),
    }
}

/// Spawn a named worker thread.
pub fn spawn<T, F>(name: String, f: F) -> Result<JoinHandle<Result<T, SoakError>>, SoakError>
where
    F: FnOnce() -> Result<T, SoakError> + Send + 'static,
    T: Send + 'static,
{
    Ok(thread::Builder::new().name(name).spawn(f)?)
}
