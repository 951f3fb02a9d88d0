//! CSV and JSON report generation.
//!
//! This module renders a [`ReportEnvelope`] into the two export formats.
//! The CSV layout (section order, headers, quoting, percentage format) is
//! consumed by spreadsheets and downstream scripts and must stay stable.

use crate::analysis::aggregate_with_limit;
use crate::clock::Clock;
use crate::models::{LocationRecord, OverallStatistics, ReportEnvelope, Severity};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Product name printed in the CSV title line.
pub const DEFAULT_PRODUCT_NAME: &str = "AI Vision";

/// Date format of the CSV `Generated on:` line.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised while encoding a report.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode JSON report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid date format '{0}'")]
    DateFormat(String),
}

/// Export format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    /// Sectioned CSV document
    Tabular,
    /// JSON encoding of the whole envelope
    Structured,
}

impl ReportFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Tabular => "csv",
            ReportFormat::Structured => "json",
        }
    }

    /// MIME type hint handed to sinks.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ReportFormat::Tabular => "text/csv;charset=utf-8",
            ReportFormat::Structured => "application/json;charset=utf-8",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportFormat::Tabular => "tabular",
            ReportFormat::Structured => "structured",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Presentation settings for the CSV format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularOptions {
    pub product_name: String,
    /// `chrono` strftime pattern for the generation date.
    pub date_format: String,
}

impl TabularOptions {
    /// Reject date patterns chrono cannot render.
    pub fn validate(&self) -> Result<(), SerializeError> {
        if is_valid_date_format(&self.date_format) {
            Ok(())
        } else {
            Err(SerializeError::DateFormat(self.date_format.clone()))
        }
    }
}

fn is_valid_date_format(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

impl Default for TabularOptions {
    fn default() -> Self {
        Self {
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl ReportEnvelope {
    /// Aggregate `locations` and stamp the result with the clock's time.
    pub fn build(
        locations: Vec<LocationRecord>,
        total_users: u64,
        total_analyses: u64,
        top_n: usize,
        clock: &dyn Clock,
    ) -> Self {
        let overall_stats = aggregate_with_limit(&locations, top_n);

        Self {
            total_users,
            total_analyses,
            report_date: clock.now(),
            location_data: locations,
            overall_stats,
        }
    }
}

/// Conventional download name, e.g. `disease-analysis-report-2024-05-01.csv`.
pub fn report_filename(date: DateTime<Utc>, format: ReportFormat) -> String {
    format!(
        "disease-analysis-report-{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Render a report with default presentation settings.
pub fn serialize(envelope: &ReportEnvelope, format: ReportFormat) -> Result<String, SerializeError> {
    serialize_with(envelope, format, &TabularOptions::default())
}

/// Render a report in the requested format.
pub fn serialize_with(
    envelope: &ReportEnvelope,
    format: ReportFormat,
    options: &TabularOptions,
) -> Result<String, SerializeError> {
    match format {
        ReportFormat::Tabular => Ok(generate_csv_report(envelope, options)),
        ReportFormat::Structured => generate_json_report(envelope),
    }
}

/// Generate the pretty-printed JSON report.
pub fn generate_json_report(envelope: &ReportEnvelope) -> Result<String, SerializeError> {
    serde_json::to_string_pretty(envelope).map_err(Into::into)
}

/// Decode a JSON report produced by [`generate_json_report`].
pub fn decode_structured(json: &str) -> Result<ReportEnvelope, SerializeError> {
    serde_json::from_str(json).map_err(Into::into)
}

/// Generate the sectioned CSV report.
pub fn generate_csv_report(envelope: &ReportEnvelope, options: &TabularOptions) -> String {
    let mut rows = Vec::new();

    rows.extend(title_rows(envelope, options));
    rows.push(String::new());

    rows.extend(summary_rows(envelope));
    rows.push(String::new());

    rows.extend(severity_rows(&envelope.overall_stats));
    rows.push(String::new());

    rows.extend(top_disease_rows(&envelope.overall_stats));
    rows.push(String::new());

    rows.extend(location_rows(&envelope.location_data));

    rows.join("\n")
}

/// Wrap a text field in double quotes, doubling any embedded quote.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn title_rows(envelope: &ReportEnvelope, options: &TabularOptions) -> Vec<String> {
    let pattern = if is_valid_date_format(&options.date_format) {
        options.date_format.as_str()
    } else {
        DEFAULT_DATE_FORMAT
    };

    vec![
        format!("{} - Disease Analysis Report", options.product_name),
        format!("Generated on: {}", envelope.report_date.format(pattern)),
    ]
}

fn summary_rows(envelope: &ReportEnvelope) -> Vec<String> {
    vec![
        "SUMMARY STATISTICS".to_string(),
        format!("Total Users,{}", envelope.total_users),
        format!("Total Analyses,{}", envelope.total_analyses),
        format!(
            "Total Disease Cases,{}",
            envelope.overall_stats.total_disease_cases
        ),
    ]
}

fn severity_rows(stats: &OverallStatistics) -> Vec<String> {
    let mut rows = vec![
        "SEVERITY BREAKDOWN".to_string(),
        "Severity Level,Count,Percentage".to_string(),
    ];

    // No data rows at all when there is nothing to divide by
    let breakdown = &stats.severity_breakdown;
    for severity in Severity::ALL {
        if let Some(percentage) = breakdown.percentage_label(severity) {
            rows.push(format!(
                "{},{},{}",
                severity,
                breakdown.get(severity),
                percentage
            ));
        }
    }

    rows
}

fn top_disease_rows(stats: &OverallStatistics) -> Vec<String> {
    let mut rows = vec![
        "TOP DISEASES".to_string(),
        "Disease Name,Total Cases".to_string(),
    ];

    for disease in &stats.top_diseases {
        rows.push(format!("{},{}", quote(&disease.name), disease.count));
    }

    rows
}

fn location_rows(locations: &[LocationRecord]) -> Vec<String> {
    let mut rows = vec![
        "LOCATION-BASED ANALYSIS".to_string(),
        "Location,Active Users,Total Cases,Disease Name,Cases,Severity".to_string(),
    ];

    for location in locations {
        let total_cases = location.total_cases();
        for (i, disease) in location.diseases.iter().enumerate() {
            let leading = if i == 0 {
                format!(
                    "{},{},{}",
                    quote(&location.name),
                    location.active_users,
                    total_cases
                )
            } else {
                ",,".to_string()
            };
            rows.push(format!(
                "{},{},{},{}",
                leading,
                quote(&disease.name),
                disease.count,
                disease.severity.as_str()
            ));
        }
    }

    rows
}
