//! CLI entry point for the signal timing analyzer.
//!
//! Provides subcommands for aggregating intersection count data into hourly
//! volume profiles and for comparing baseline vs. alternative timing plans.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use signal_timing_analyzer::{
    aggregate::aggregate_by_hour,
    analysis::{
        compare::compare_plans,
        delay::DelayStrategy,
        plan::generate_plan,
    },
    ingest::{load_counts, validate},
    output::{append_record, print_json, save_results},
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "signal_timing_analyzer")]
#[command(about = "A tool to analyze traffic signal timing from intersection counts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a CSV of intersection counts into a 24-hour volume profile
    Analyze {
        /// Path to the input counts CSV
        #[arg(value_name = "FILE")]
        source: String,

        /// CSV file to write the hourly profile to
        #[arg(short, long, default_value = "hourly_profile.csv")]
        output: String,
    },
    /// Compare a baseline timing plan against an alternative derived from the data
    Compare {
        /// Path to the input counts CSV
        #[arg(value_name = "FILE")]
        source: String,

        /// CSV file to append comparison metrics to
        #[arg(short, long, default_value = "comparison.csv")]
        output: String,

        /// Delay estimator to use for both sides of the comparison
        #[arg(short = 's', long, value_enum, default_value_t = DelayStrategy::CycleRelative)]
        strategy: DelayStrategy,
    },
}

/// One row of the hourly profile table.
#[derive(Serialize)]
struct HourlyProfileRow {
    hour: usize,
    volume: f64,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/signal_timing_analyzer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("signal_timing_analyzer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { source, output } => {
            let table = load_counts(&source)?;

            let report = validate(&table);
            for advisory in &report.advisories {
                warn!(%advisory, "Data quality advisory");
            }

            let volumes = aggregate_by_hour(&table)?;
            let rows: Vec<HourlyProfileRow> = volumes
                .iter()
                .map(|(hour, volume)| HourlyProfileRow { hour, volume })
                .collect();

            save_results(&rows, &output)?;
            info!(
                source = %source,
                output = %output,
                total_volume = volumes.total(),
                "Hourly profile written"
            );
        }
        Commands::Compare {
            source,
            output,
            strategy,
        } => {
            let table = load_counts(&source)?;

            let report = validate(&table);
            for advisory in &report.advisories {
                warn!(%advisory, "Data quality advisory");
            }

            let baseline = generate_plan(&table, false)?;
            let alternative = generate_plan(&table, true)?;
            info!(baseline = %baseline, alternative = %alternative, "Plans generated");

            let volumes: Vec<f64> = table.records().iter().map(|r| r.count).collect();
            let metrics = compare_plans(&baseline, &alternative, &volumes, strategy);

            print_json(&metrics)?;
            append_record(&output, &metrics)?;
            info!(
                output = %output,
                improvement_pct = metrics.improvement_pct,
                "Comparison appended"
            );
        }
    }

    Ok(())
}
