//! AI Vision disease analysis reporting.
//!
//! This library consolidates disease-detection observations recorded
//! across many locations into summary statistics and renders them as CSV
//! or JSON exports. It can be used independently of the CLI binary.

pub mod analysis;
pub mod clock;
pub mod ingest;
pub mod models;
pub mod report;

// Re-export commonly used types for convenience
pub use analysis::{aggregate, aggregate_with_limit, DEFAULT_TOP_DISEASES};
pub use clock::{Clock, FixedClock, SystemClock};
pub use models::*;
pub use report::{export_report, serialize, ReportFormat, ReportSink};
