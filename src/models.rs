//! Data models for the reporting engine.
//!
//! This module contains the location/disease observations fed into the
//! aggregator, the statistics it derives, and the envelope handed to the
//! serializer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Severity tier of a detected condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low severity - mild, self-limiting conditions
    Low,
    /// Medium severity - needs follow-up
    Medium,
    /// High severity - needs prompt attention
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

impl Severity {
    /// All tiers, in report order.
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    /// Returns the lowercase wire name used in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Parse a wire name. Matching is case-insensitive.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(ValidationError::UnknownSeverity(s.to_string())),
        }
    }
}

/// Rejections raised when raw observations are accepted into the model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("location name must not be empty")]
    EmptyLocationName,

    #[error("disease name must not be empty (location '{location}')")]
    EmptyDiseaseName { location: String },

    #[error("negative case count {count} for '{disease}' at '{location}'")]
    NegativeCount {
        location: String,
        disease: String,
        count: i64,
    },

    #[error("negative active user count {users} at '{location}'")]
    NegativeUsers { location: String, users: i64 },

    #[error("unknown severity '{0}' (expected low, medium or high)")]
    UnknownSeverity(String),

    #[error("coordinates of '{location}' are not finite")]
    InvalidCoordinates { location: String },
}

/// Number of times a named condition was seen at one severity in one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseObservation {
    pub name: String,
    pub count: u64,
    pub severity: Severity,
}

impl DiseaseObservation {
    pub fn new(name: impl Into<String>, count: u64, severity: Severity) -> Self {
        Self {
            name: name.into(),
            count,
            severity,
        }
    }
}

/// Latitude/longitude pair of a monitored location.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// One monitored location and everything detected there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub name: String,
    pub active_users: u64,
    pub diseases: Vec<DiseaseObservation>,
    pub coordinates: GeoPoint,
}

impl LocationRecord {
    /// Creates a location with no observations.
    pub fn new(name: impl Into<String>, active_users: u64, coordinates: GeoPoint) -> Self {
        Self {
            name: name.into(),
            active_users,
            diseases: Vec::new(),
            coordinates,
        }
    }

    /// Builder-style helper to append an observation.
    pub fn with_disease(mut self, name: impl Into<String>, count: u64, severity: Severity) -> Self {
        self.diseases
            .push(DiseaseObservation::new(name, count, severity));
        self
    }

    /// Sum of every observation count at this location, saturating at `u64::MAX`.
    pub fn total_cases(&self) -> u64 {
        self.diseases
            .iter()
            .fold(0u64, |total, d| total.saturating_add(d.count))
    }
}

/// A `(name, totalCount)` row of a ranked frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub name: String,
    pub count: u64,
}

impl RankedEntry {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Case counts per severity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl SeverityBreakdown {
    pub fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
        }
    }

    pub fn add(&mut self, severity: Severity, count: u64) {
        match severity {
            Severity::Low => self.low = self.low.saturating_add(count),
            Severity::Medium => self.medium = self.medium.saturating_add(count),
            Severity::High => self.high = self.high.saturating_add(count),
        }
    }

    pub fn total(&self) -> u64 {
        self.low
            .saturating_add(self.medium)
            .saturating_add(self.high)
    }

    /// Share of `severity` in tenths of a percent, rounded half up.
    ///
    /// Computed with integer arithmetic so `1/16` renders as `6.3`, not
    /// whatever the nearest float happens to round to. Returns `None` when
    /// there are no cases at all.
    pub fn percentage_tenths(&self, severity: Severity) -> Option<u64> {
        let total = self.total() as u128;
        if total == 0 {
            return None;
        }
        let count = self.get(severity) as u128;
        Some(((count * 2000 + total) / (2 * total)) as u64)
    }

    /// Formats the share of `severity` as `x.y%`.
    pub fn percentage_label(&self, severity: Severity) -> Option<String> {
        self.percentage_tenths(severity)
            .map(|tenths| format!("{}.{}%", tenths / 10, tenths % 10))
    }
}

/// Global statistics derived from a set of locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStatistics {
    pub total_disease_cases: u64,
    pub severity_breakdown: SeverityBreakdown,
    pub top_diseases: Vec<RankedEntry>,
    pub top_locations: Vec<RankedEntry>,
}

/// Everything a report is rendered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEnvelope {
    pub total_users: u64,
    pub total_analyses: u64,
    pub report_date: DateTime<Utc>,
    pub location_data: Vec<LocationRecord>,
    pub overall_stats: OverallStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("low"), Ok(Severity::Low));
        assert_eq!(Severity::parse("MEDIUM"), Ok(Severity::Medium));
        assert_eq!(Severity::parse(" High "), Ok(Severity::High));
        assert_eq!(
            Severity::parse("critical"),
            Err(ValidationError::UnknownSeverity("critical".to_string()))
        );
    }

    #[test]
    fn test_severity_names() {
        assert_eq!(Severity::High.to_string(), "High");
        assert_eq!(Severity::High.as_str(), "high");
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), "\"medium\"");
    }

    #[test]
    fn test_location_total_cases() {
        let location = LocationRecord::new("Alpha", 10, GeoPoint::new(40.7, -74.0))
            .with_disease("X", 5, Severity::Low)
            .with_disease("Y", 3, Severity::High);
        assert_eq!(location.total_cases(), 8);
    }

    #[test]
    fn test_percentage_rounding() {
        let breakdown = SeverityBreakdown {
            low: 1,
            medium: 15,
            high: 0,
        };
        // 6.25% rounds half up, 93.75% too
        assert_eq!(breakdown.percentage_label(Severity::Low).as_deref(), Some("6.3%"));
        assert_eq!(breakdown.percentage_label(Severity::Medium).as_deref(), Some("93.8%"));
        assert_eq!(breakdown.percentage_label(Severity::High).as_deref(), Some("0.0%"));
    }

    #[test]
    fn test_counts_saturate_instead_of_overflowing() {
        let location = LocationRecord::new("Huge", 1, GeoPoint::default())
            .with_disease("A", u64::MAX, Severity::Low)
            .with_disease("B", 5, Severity::Low);
        assert_eq!(location.total_cases(), u64::MAX);

        let mut breakdown = SeverityBreakdown::default();
        breakdown.add(Severity::Low, u64::MAX);
        breakdown.add(Severity::Low, 1);
        breakdown.add(Severity::High, 7);
        assert_eq!(breakdown.low, u64::MAX);
        assert_eq!(breakdown.total(), u64::MAX);
        assert_eq!(breakdown.percentage_label(Severity::Low).as_deref(), Some("100.0%"));
    }

    #[test]
    fn test_percentage_zero_total() {
        let breakdown = SeverityBreakdown::default();
        assert_eq!(breakdown.percentage_tenths(Severity::Low), None);
        assert_eq!(breakdown.percentage_label(Severity::High), None);
    }

    #[test]
    fn test_envelope_field_names() {
        let envelope = ReportEnvelope {
            total_users: 1,
            total_analyses: 2,
            report_date: DateTime::from_timestamp(0, 0).unwrap(),
            location_data: vec![LocationRecord::new("A", 3, GeoPoint::default())],
            overall_stats: OverallStatistics::default(),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"totalUsers\":1"));
        assert!(json.contains("\"reportDate\":\"1970-01-01T00:00:00Z\""));
        assert!(json.contains("\"activeUsers\":3"));
        assert!(json.contains("\"totalDiseaseCases\":0"));
        assert!(json.contains("\"severityBreakdown\""));
    }
}
