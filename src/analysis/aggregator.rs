//! Disease aggregation and statistics.
//!
//! This module reduces per-location observations into global totals, a
//! severity distribution, and ranked disease/location frequency tables.
//! Everything here is a pure projection of its input.

use crate::models::{LocationRecord, OverallStatistics, RankedEntry, SeverityBreakdown};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Number of diseases kept in `topDiseases` when generating a report.
pub const DEFAULT_TOP_DISEASES: usize = 10;

/// Number of diseases shown in the dashboard preview.
pub const PREVIEW_TOP_DISEASES: usize = 5;

/// Running totals keyed by name, remembering first-appearance order.
#[derive(Debug, Default)]
struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<RankedEntry>,
}

impl Tally {
    fn add(&mut self, name: &str, count: u64) {
        match self.index.get(name) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.count = entry.count.saturating_add(count);
            }
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(RankedEntry::new(name, count));
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Descending by count. `sort_by_key` is stable, so ties keep
    /// first-appearance order.
    fn into_ranked(self) -> Vec<RankedEntry> {
        let mut entries = self.entries;
        entries.sort_by_key(|e| std::cmp::Reverse(e.count));
        entries
    }
}

/// Accumulated state of a single pass over the input.
///
/// Every sum saturates at `u64::MAX`; counts are unbounded non-negative
/// integers and the pass must not panic on them.
#[derive(Debug, Default)]
struct Accumulator {
    total: u64,
    severity: SeverityBreakdown,
    diseases: Tally,
    locations: Tally,
}

impl Accumulator {
    fn from_locations(locations: &[LocationRecord]) -> Self {
        let mut acc = Self::default();

        for location in locations {
            let mut location_total: u64 = 0;
            for disease in &location.diseases {
                acc.total = acc.total.saturating_add(disease.count);
                acc.severity.add(disease.severity, disease.count);
                acc.diseases.add(&disease.name, disease.count);
                location_total = location_total.saturating_add(disease.count);
            }
            // Repeated location names are merged, never overwritten
            acc.locations.add(&location.name, location_total);
        }

        debug!(
            locations = locations.len(),
            diseases = acc.diseases.len(),
            total = acc.total,
            "Aggregated observations"
        );

        acc
    }
}

/// Aggregate every location into global statistics with full ranked lists.
pub fn aggregate(locations: &[LocationRecord]) -> OverallStatistics {
    let acc = Accumulator::from_locations(locations);

    OverallStatistics {
        total_disease_cases: acc.total,
        severity_breakdown: acc.severity,
        top_diseases: acc.diseases.into_ranked(),
        top_locations: acc.locations.into_ranked(),
    }
}

/// Aggregate, keeping only the `top_n` most frequent diseases.
///
/// Totals and the severity breakdown still cover all data, and
/// `top_locations` is never truncated.
pub fn aggregate_with_limit(locations: &[LocationRecord], top_n: usize) -> OverallStatistics {
    let mut stats = aggregate(locations);
    stats.top_diseases.truncate(top_n);
    stats
}

/// Sum of active users over all locations.
pub fn total_active_users(locations: &[LocationRecord]) -> u64 {
    locations
        .iter()
        .fold(0u64, |total, l| total.saturating_add(l.active_users))
}

/// Headline numbers shown before a report is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPreview {
    pub total_cases: u64,
    pub disease_types: usize,
    pub locations: usize,
    pub severity_breakdown: SeverityBreakdown,
    pub top_diseases: Vec<RankedEntry>,
}

/// Compute the preview card for a set of locations.
pub fn preview(locations: &[LocationRecord]) -> ReportPreview {
    let acc = Accumulator::from_locations(locations);
    let disease_types = acc.diseases.len();
    let mut top_diseases = acc.diseases.into_ranked();
    top_diseases.truncate(PREVIEW_TOP_DISEASES);

    ReportPreview {
        total_cases: acc.total,
        disease_types,
        locations: locations.len(),
        severity_breakdown: acc.severity,
        top_diseases,
    }
}
