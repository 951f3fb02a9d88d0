//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use aivision_report::ReportFormat;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// AI Vision report generator
///
/// Consolidates disease-detection observations recorded across
/// locations into a CSV or JSON analysis report.
///
/// Examples:
///   aivision-report --input locations.json
///   aivision-report --input locations.json --format json --output-dir reports
///   aivision-report --input locations.json --stdout --top 5
///   aivision-report --input locations.json --summary
///   aivision-report --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON file with the location data to report on
    ///
    /// An array of locations, each with a name, active users, a list of
    /// { name, count, severity } observations and optional coordinates.
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output format (csv, json)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Directory the report is written to
    #[arg(short, long, value_name = "DIR", env = "AIVISION_REPORT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Set when `output_dir` came from the command line rather than the environment.
    #[arg(skip)]
    pub output_dir_from_cli: bool,

    /// Print the report to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Total users to report (default: sum of active users)
    #[arg(long, value_name = "COUNT")]
    pub total_users: Option<u64>,

    /// Total analyses to report (default: total disease cases)
    #[arg(long, value_name = "COUNT")]
    pub total_analyses: Option<u64>,

    /// Number of diseases listed under TOP DISEASES
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Product name used in the CSV title
    #[arg(long, value_name = "NAME")]
    pub product: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .aivision-report.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print a summary of the data without generating a report
    #[arg(long)]
    pub summary: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .aivision-report.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Sectioned CSV (default)
    #[default]
    Csv,
    /// JSON document
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => ReportFormat::Tabular,
            OutputFormat::Json => ReportFormat::Structured,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::try_parse_args_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Parse arguments from an iterator, reporting errors instead of exiting.
    pub fn try_parse_args_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(itr)?;
        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        let mut args = Self::from_arg_matches(matches)?;
        args.output_dir_from_cli =
            matches.value_source("output_dir") == Some(ValueSource::CommandLine);
        Ok(args)
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.input {
            Some(ref input) if !input.is_file() => {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            None => return Err("An --input file is required".to_string()),
            _ => {}
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // AIVISION_REPORT_DIR alone does not conflict with --stdout
        if self.stdout && self.output_dir_from_cli {
            return Err("Cannot use both --stdout and --output-dir".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `general.verbose` from the config file; `--quiet`
    /// overrides both it and `--verbose`.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
