//! CLI entry point for the route summary generator.
//!
//! Adapts two CSV files onto the engine's row-level interface, runs the
//! pipeline, and writes the five views plus the diagnostics log to the
//! output directory.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use route_summaries::diagnostics::DiagnosticLog;
use route_summaries::engine::generate_summary;
use route_summaries::output::{write_json_report, write_log, write_report};
use route_summaries::records::{RawRideCheck, RawStopRow};

#[derive(Parser)]
#[command(name = "route_summaries")]
#[command(about = "Generate a ridership summary for bus routes", long_about = None)]
struct Cli {
    /// CSV file of ride-check rows
    #[arg(value_name = "RIDE_CHECKS")]
    ride_checks: PathBuf,

    /// CSV file of bus stop tables
    #[arg(value_name = "BUS_STOPS")]
    bus_stops: PathBuf,

    /// Directory to write the five views and the run log into
    #[arg(short, long, default_value = "summary")]
    output: PathBuf,

    /// Also dump the whole report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/route_summaries.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("route_summaries.log"));

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

    let ride_checks = read_ride_checks(&cli.ride_checks)?;
    let stop_rows = read_stop_rows(&cli.bus_stops)?;
    info!(
        ride_checks = ride_checks.len(),
        stop_rows = stop_rows.len(),
        "Input loaded"
    );

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("could not create output directory {}", cli.output.display()))?;

    let log = DiagnosticLog::new();
    let result = generate_summary(&ride_checks, &[stop_rows], &log);

    // The log is written even when the run fails; it names the reason.
    write_log(cli.output.join("log.txt"), &log.entries())?;

    match result {
        Ok(report) => {
            write_report(&cli.output, &report)?;
            if cli.json {
                write_json_report(cli.output.join("report.json"), &report)?;
            }
            info!(
                warnings = log.warning_count(),
                errors = log.error_count(),
                "Summary written to {}",
                cli.output.display()
            );
            Ok(())
        }
        Err(err) => {
            error!("Generation failed: {err}");
            Err(err)
        }
    }
}

fn read_ride_checks(path: &Path) -> Result<Vec<RawRideCheck>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("could not open the ride checks file '{}'", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn read_stop_rows(path: &Path) -> Result<Vec<RawStopRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("could not open the bus stop file '{}'", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}
