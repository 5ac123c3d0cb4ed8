//! rtx-soak - soak and latency runner for rt-exchange
//!
//! Drives each exchange type with real producer and consumer threads, checks that
//! no value is torn, duplicated or reordered, and reports push-to-pop latency.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod config;
mod error;
mod report;
mod scenarios;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigOverrides, SoakConfig};
use crate::error::SoakError;
use crate::report::ScenarioReport;
use crate::scenarios::Scenario;

#[derive(Parser, Debug)]
#[command(name = "rtx-soak")]
#[command(about = "Soak test the rt-exchange primitives with real threads")]
#[command(version)]
#[command(long_about = "
rtx-soak pushes stamped frames through the lock-free and spin lock exchanges from
producer threads and checks every frame the consumer threads receive.

A run fails with a non-zero exit code when any frame is torn, delivered twice or
delivered out of order. Use --json for machine-readable reports.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(long, global = true, help = "Output in JSON format for machine parsing")]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// JSON configuration file, command line options take precedence
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Lock-free single element queue, one producer and one consumer
    LockfreeQueue,

    /// Lock-free atomic value, one writer and one reader
    LockfreeValue,

    /// Spin lock single element queue, many producers and consumers
    SpinQueue,

    /// Spin lock atomic value, many writers and readers
    SpinValue,

    /// Spin lock mutual exclusion on a non-atomic counter
    SpinLock,

    /// Run every scenario in turn
    All,
}

impl Commands {
    fn scenarios(self) -> &'static [Scenario] {
        match self {
            Commands::LockfreeQueue => &[Scenario::LockfreeQueue],
            Commands::LockfreeValue => &[Scenario::LockfreeValue],
            Commands::SpinQueue => &[Scenario::SpinQueue],
            Commands::SpinValue => &[Scenario::SpinValue],
            Commands::SpinLock => &[Scenario::SpinLock],
            Commands::All => &Scenario::ALL,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("rtx_soak={log_level},rt_exchange={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute(&cli) {
        Ok(()) => Ok(()),
        Err(e) => {
            let soak_error = e.downcast_ref::<SoakError>();
            // Failed checks are already part of the JSON report
            let reported = matches!(
                soak_error,
                Some(SoakError::Corruption { .. } | SoakError::Overdelivery { .. })
            );
            if !cli.json {
                report::print_error_human(&e);
            } else if !reported {
                report::print_error_json(&e);
            }

            let exit_code = soak_error.map_or(1, SoakError::exit_code);
            std::process::exit(exit_code);
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let config = SoakConfig::resolve(cli.config.as_deref(), &cli.overrides)?;
    tracing::debug!(?config, "resolved soak configuration");

    let reports = run_scenarios(cli.command.scenarios(), &config)?;

    if cli.json {
        report::print_reports_json(&reports);
    } else {
        report::print_reports_human(&reports);
    }

    for report in &reports {
        report.check()?;
    }
    Ok(())
}

fn run_scenarios(
    scenarios: &[Scenario],
    config: &SoakConfig,
) -> Result<Vec<ScenarioReport>, SoakError> {
    scenarios.iter().map(|s| s.run(config)).collect()
}
