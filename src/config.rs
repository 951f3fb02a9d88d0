//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.aivision-report.toml` files.

use crate::cli::OutputFormat;
use aivision_report::analysis::DEFAULT_TOP_DISEASES;
use aivision_report::report::{TabularOptions, DEFAULT_DATE_FORMAT, DEFAULT_PRODUCT_NAME};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".aivision-report.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory reports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Default export format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
            verbose: false,
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Product name in the CSV title line.
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// Number of diseases under TOP DISEASES.
    #[serde(default = "default_top_diseases")]
    pub top_diseases: usize,

    /// strftime pattern of the `Generated on:` line.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            product_name: default_product_name(),
            top_diseases: default_top_diseases(),
            date_format: default_date_format(),
        }
    }
}

fn default_product_name() -> String {
    DEFAULT_PRODUCT_NAME.to_string()
}

fn default_top_diseases() -> usize {
    DEFAULT_TOP_DISEASES
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl ReportConfig {
    /// Presentation options for the serializer.
    pub fn tabular_options(&self) -> TabularOptions {
        TabularOptions {
            product_name: self.product_name.clone(),
            date_format: self.date_format.clone(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.report.top_diseases == 0 {
            anyhow::bail!("report.top_diseases must be at least 1");
        }
        self.report.tabular_options().validate()?;
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.display().to_string();
        }
        if let Some(top) = args.top {
            self.report.top_diseases = top;
        }
        if let Some(ref product) = args.product {
            self.report.product_name = product.clone();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
