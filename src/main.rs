//! AI Vision report generator
//!
//! A CLI tool that consolidates disease-detection observations from
//! many locations into summary statistics and exports them as a CSV
//! or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (bad input, config, or the report could not be saved)

mod cli;
mod config;

use aivision_report::analysis::{preview, total_active_users};
use aivision_report::ingest::load_locations;
use aivision_report::report::{FileSink, StdoutSink};
use aivision_report::{export_report, LocationRecord, ReportEnvelope, ReportFormat, ReportSink};
use aivision_report::{Severity, SystemClock};
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration first so `general.verbose` can set the log level
    let (config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("aivision-report v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    if let Err(e) = run_report(args, config) {
        error!("Report generation failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        eprintln!("   Nothing was saved. Fix the problem and run the command again.");
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .aivision-report.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the output directory, format and report title.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete load, aggregate, render and save workflow.
fn run_report(args: Args, config: Config) -> Result<()> {
    let input = args
        .input
        .as_deref()
        .context("An --input file is required")?;
    let locations = load_locations(input)
        .with_context(|| format!("Failed to load location data from {}", input.display()))?;

    if args.summary {
        print_summary(&locations);
        return Ok(());
    }

    let total_users = args
        .total_users
        .unwrap_or_else(|| total_active_users(&locations));
    let total_analyses = args
        .total_analyses
        .unwrap_or_else(|| {
            locations
                .iter()
                .fold(0u64, |total, l| total.saturating_add(l.total_cases()))
        });

    let envelope = ReportEnvelope::build(
        locations,
        total_users,
        total_analyses,
        config.report.top_diseases,
        &SystemClock,
    );

    let format = ReportFormat::from(config.general.format);
    let options = config.report.tabular_options();

    let sink: Box<dyn ReportSink> = if args.stdout {
        Box::new(StdoutSink)
    } else {
        Box::new(FileSink::new(&config.general.output_dir))
    };

    let saved = export_report(&envelope, format, &options, sink.as_ref())
        .context("Failed to generate report")?;

    if !args.stdout && !args.quiet {
        let stats = &envelope.overall_stats;
        println!("\n📊 Report Summary:");
        println!("   Locations: {}", envelope.location_data.len());
        println!("   Total disease cases: {}", stats.total_disease_cases);
        println!(
            "   - 🟢 Low: {} | 🟡 Medium: {} | 🔴 High: {}",
            stats.severity_breakdown.low,
            stats.severity_breakdown.medium,
            stats.severity_breakdown.high
        );
        if let Some(ref path) = saved.path {
            println!("\n✅ Report saved to: {}", path.display());
        }
    }

    Ok(())
}

/// Handle --summary: print the preview numbers and exit.
fn print_summary(locations: &[LocationRecord]) {
    let preview = preview(locations);

    println!("\n🔍 Data summary (no report generated):\n");
    println!("   Total cases:   {}", preview.total_cases);
    println!("   Disease types: {}", preview.disease_types);
    println!("   Locations:     {}", preview.locations);

    println!("\n   Severity distribution:");
    for severity in Severity::ALL {
        let share = preview
            .severity_breakdown
            .percentage_label(severity)
            .unwrap_or_else(|| "0%".to_string());
        println!(
            "     {:<7} {:>6} ({})",
            severity.to_string(),
            preview.severity_breakdown.get(severity),
            share
        );
    }

    if !preview.top_diseases.is_empty() {
        println!("\n   Top diseases:");
        for (i, disease) in preview.top_diseases.iter().enumerate() {
            println!("     {}. {} ({} cases)", i + 1, disease.name, disease.count);
        }
    }
}

/// Where the effective configuration came from. Logged once logging is up.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    Defaults,
    Fallback(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE_NAME),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    let (mut config, source) = if let Some(ref config_path) = args.config {
        // An explicit path must load
        (
            Config::load(config_path)?,
            ConfigSource::Explicit(config_path.clone()),
        )
    } else {
        match Config::load_default() {
            Ok(Some(config)) => (config, ConfigSource::DefaultFile),
            Ok(None) => (Config::default(), ConfigSource::Defaults),
            Err(e) => (Config::default(), ConfigSource::Fallback(e)),
        }
    };

    config.merge_with_args(args);
    config.validate()?;
    Ok((config, source))
}
