//! Scenario reports and their output formats

use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;
use serde_json::json;

use crate::error::SoakError;

/// Highest latency the histograms track, in nanoseconds.
const MAX_TRACKED_NS: u64 = 60_000_000_000;

/// Push-to-pop latency samples collected on the consumer side.
#[derive(Debug, Clone)]
pub struct Latency {
    histogram: Histogram<u64>,
}

impl Latency {
    pub fn new() -> Result<Self, SoakError> {
        Ok(Self {
            histogram: Histogram::new_with_max(MAX_TRACKED_NS, 3)?,
        })
    }

    #[inline]
    pub fn record(&mut self, nanos: u64) {
        self.histogram.saturating_record(nanos);
    }

    pub fn merge(&mut self, other: &Latency) -> Result<(), SoakError> {
        self.histogram.add(&other.histogram)?;
        Ok(())
    }

    pub fn summary(&self) -> LatencySummary {
        let h = &self.histogram;
        if h.is_empty() {
            return LatencySummary::default();
        }
        LatencySummary {
            samples: h.len(),
            p50_ns: h.value_at_quantile(0.50),
            p99_ns: h.value_at_quantile(0.99),
            p999_ns: h.value_at_quantile(0.999),
            max_ns: h.max(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub p50_ns: u64,
    pub p99_ns: u64,
    pub p999_ns: u64,
    pub max_ns: u64,
}

/// Outcome of one scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub scenario: &'static str,
    pub producers: usize,
    pub consumers: usize,
    /// Values handed to the exchange
    pub pushed: u64,
    /// Values taken out of the exchange
    pub popped: u64,
    /// Values replaced before anyone took them
    pub dropped: u64,
    /// Torn, duplicated or out of order values
    pub corrupted: u64,
    pub elapsed_ms: f64,
    pub latency: LatencySummary,
}

impl ScenarioReport {
    pub fn new(scenario: &'static str, producers: usize, consumers: usize) -> Self {
        Self {
            scenario,
            producers,
            consumers,
            pushed: 0,
            popped: 0,
            dropped: 0,
            corrupted: 0,
            elapsed_ms: 0.0,
            latency: LatencySummary::default(),
        }
    }

    pub fn finish(mut self, elapsed: Duration, latency: &Latency) -> Self {
        self.elapsed_ms = elapsed.as_secs_f64() * 1_000.0;
        self.latency = latency.summary();
        self
    }

    /// Turn a broken exchange contract into an error.
    pub fn check(&self) -> Result<(), SoakError> {
        if self.corrupted > 0 {
            return Err(SoakError::Corruption {
                scenario: self.scenario,
                count: self.corrupted,
            });
        }
        if self.popped > self.pushed {
            return Err(SoakError::Overdelivery {
                scenario: self.scenario,
                pushed: self.pushed,
                popped: self.popped,
            });
        }
        Ok(())
    }
}

/// Print reports in JSON format
pub fn print_reports_json(reports: &[ScenarioReport]) {
    let output = json!({
        "success": reports.iter().all(|r| r.check().is_ok()),
        "reports": reports,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format reports as JSON: {e}"),
    }
}

/// Print reports in human-readable format
pub fn print_reports_human(reports: &[ScenarioReport]) {
    for report in reports {
        println!(
            "{} ({}P/{}C) in {:.1} ms",
            report.scenario, report.producers, report.consumers, report.elapsed_ms
        );
        println!(
            "  pushed {}  popped {}  dropped {}  corrupted {}",
            report.pushed, report.popped, report.dropped, report.corrupted
        );
        let l = &report.latency;
        if l.samples > 0 {
            println!(
                "  latency p50 {} ns  p99 {} ns  p99.9 {} ns  max {} ns",
                l.p50_ns, l.p99_ns, l.p999_ns, l.max_ns
            );
        }
    }
}

/// Print error in JSON format
pub fn print_error_json(error: &anyhow::Error) {
    let output = json!({
        "success": false,
        "error": { "message": error.to_string() }
    });
    match serde_json::to_string_pretty(&output) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &anyhow::Error) {
    eprintln!("Error: {error}");
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_latency_summary_percentiles() -> TestResult {
        let mut latency = Latency::new()?;
        for ns in 1..=1_000 {
            latency.record(ns);
        }
        let summary = latency.summary();
        assert_eq!(summary.samples, 1_000);
        assert!(summary.p50_ns <= summary.p99_ns);
        assert!(summary.p99_ns <= summary.p999_ns);
        assert!(summary.p999_ns <= summary.max_ns);
        Ok(())
    }

    #[test]
    fn test_empty_latency_summary() -> TestResult {
        assert_eq!(Latency::new()?.summary(), LatencySummary::default());
        Ok(())
    }

    #[test]
    fn test_merge_adds_samples() -> TestResult {
        let mut a = Latency::new()?;
        let mut b = Latency::new()?;
        a.record(10);
        b.record(20);
        a.merge(&b)?;
        assert_eq!(a.summary().samples, 2);
        Ok(())
    }

    #[test]
    fn test_check_reports_corruption() {
        let mut report = ScenarioReport::new("spin-value", 1, 1);
        assert!(report.check().is_ok());
        report.corrupted = 1;
        assert!(matches!(
            report.check(),
            Err(SoakError::Corruption { count: 1, .. })
        ));
    }

    #[test]
    fn test_check_reports_overdelivery() {
        let mut report = ScenarioReport::new("spin-queue", 2, 2);
        report.pushed = 5;
        report.popped = 6;
        assert!(matches!(
            report.check(),
            Err(SoakError::Overdelivery { .. })
        ));
    }

    #[test]
    fn test_report_serializes_counts() -> TestResult {
        let mut report = ScenarioReport::new("lockfree-queue", 1, 1);
        report.pushed = 3;
        let value = serde_json::to_value(&report)?;
        assert_eq!(value["scenario"], "lockfree-queue");
        assert_eq!(value["pushed"], 3);
        assert_eq!(value["latency"]["samples"], 0);
        Ok(())
    }
}
