//! Loading and validating location data.
//!
//! Raw observations arrive as loosely-typed JSON (signed counts, free-form
//! severity strings, either coordinate shape the dashboard produces). They
//! are checked here once, so everything downstream can rely on the model's
//! invariants.

use crate::models::{DiseaseObservation, GeoPoint, LocationRecord, Severity, ValidationError};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading location data.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed location data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("location #{index}: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: ValidationError,
    },
}

/// A disease observation as supplied by the producer.
#[derive(Debug, Clone, Deserialize)]
pub struct RawObservation {
    pub name: String,
    pub count: i64,
    pub severity: String,
}

/// Coordinates as either `[lat, lon]` or `{ "latitude": .., "longitude": .. }`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinates {
    Pair([f64; 2]),
    Named { latitude: f64, longitude: f64 },
}

impl From<RawCoordinates> for GeoPoint {
    fn from(raw: RawCoordinates) -> Self {
        match raw {
            RawCoordinates::Pair([latitude, longitude]) => GeoPoint::new(latitude, longitude),
            RawCoordinates::Named {
                latitude,
                longitude,
            } => GeoPoint::new(latitude, longitude),
        }
    }
}

/// A location as supplied by the producer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    pub name: String,
    #[serde(alias = "users", default)]
    pub active_users: i64,
    #[serde(default)]
    pub diseases: Vec<RawObservation>,
    pub coordinates: Option<RawCoordinates>,
}

impl RawObservation {
    fn validate(self, location: &str) -> Result<DiseaseObservation, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyDiseaseName {
                location: location.to_string(),
            });
        }
        if self.count < 0 {
            return Err(ValidationError::NegativeCount {
                location: location.to_string(),
                disease: self.name,
                count: self.count,
            });
        }
        let severity = Severity::parse(&self.severity)?;

        Ok(DiseaseObservation::new(self.name, self.count as u64, severity))
    }
}

impl TryFrom<RawLocation> for LocationRecord {
    type Error = ValidationError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        if raw.name.trim().is_empty() {
            return Err(ValidationError::EmptyLocationName);
        }
        if raw.active_users < 0 {
            return Err(ValidationError::NegativeUsers {
                location: raw.name,
                users: raw.active_users,
            });
        }

        let coordinates = raw.coordinates.map(GeoPoint::from).unwrap_or_default();
        if !coordinates.is_finite() {
            return Err(ValidationError::InvalidCoordinates { location: raw.name });
        }

        let diseases = raw
            .diseases
            .into_iter()
            .map(|d| d.validate(&raw.name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LocationRecord {
            name: raw.name,
            active_users: raw.active_users as u64,
            diseases,
            coordinates,
        })
    }
}

/// Validate a batch of raw locations, stopping at the first rejection.
pub fn validate_locations(raw: Vec<RawLocation>) -> Result<Vec<LocationRecord>, IngestError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, location)| {
            LocationRecord::try_from(location).map_err(|source| IngestError::Invalid { index, source })
        })
        .collect()
}

/// Parse and validate a JSON array of locations.
pub fn parse_locations(json: &str) -> Result<Vec<LocationRecord>, IngestError> {
    let raw: Vec<RawLocation> = serde_json::from_str(json)?;
    debug!("Parsed {} raw locations", raw.len());
    validate_locations(raw)
}

/// Read, parse and validate a JSON location file.
pub fn load_locations(path: &Path) -> Result<Vec<LocationRecord>, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let locations = parse_locations(&content)?;
    info!(
        "Loaded {} locations from {}",
        locations.len(),
        path.display()
    );

    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dashboard_shape() {
        let json = r#"[
            {
                "name": "Test City 1",
                "users": 100,
                "diseases": [
                    { "name": "Test Disease A", "count": 25, "severity": "low" },
                    { "name": "Test Disease B", "count": 15, "severity": "medium" }
                ],
                "coordinates": [40.7128, -74.0060]
            }
        ]"#;

        let locations = parse_locations(json).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].active_users, 100);
        assert_eq!(locations[0].coordinates, GeoPoint::new(40.7128, -74.006));
        assert_eq!(locations[0].diseases[1].severity, Severity::Medium);
    }

    #[test]
    fn test_parse_named_coordinates() {
        let json = r#"[{
            "name": "Chicago",
            "activeUsers": 7,
            "diseases": [],
            "coordinates": { "latitude": 41.8781, "longitude": -87.6298 }
        }]"#;

        let locations = parse_locations(json).unwrap();
        assert_eq!(locations[0].active_users, 7);
        assert_eq!(locations[0].coordinates.longitude, -87.6298);
        assert!(locations[0].diseases.is_empty());
    }

    #[test]
    fn test_rejects_negative_count() {
        let json = r#"[{ "name": "A", "users": 1, "diseases": [
            { "name": "X", "count": -3, "severity": "low" }
        ]}]"#;

        match parse_locations(json) {
            Err(IngestError::Invalid { index, source }) => {
                assert_eq!(index, 0);
                assert!(matches!(source, ValidationError::NegativeCount { count: -3, .. }));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_severity() {
        let json = r#"[
            { "name": "A", "users": 1, "diseases": [] },
            { "name": "B", "users": 1, "diseases": [
                { "name": "X", "count": 3, "severity": "severe" }
            ]}
        ]"#;

        let err = parse_locations(json).unwrap_err();
        assert!(matches!(err, IngestError::Invalid { index: 1, .. }));
        assert!(err.to_string().contains("severe"));
    }

    #[test]
    fn test_rejects_negative_users_and_empty_names() {
        let raw = RawLocation {
            name: "A".to_string(),
            active_users: -1,
            diseases: vec![],
            coordinates: None,
        };
        assert!(matches!(
            LocationRecord::try_from(raw),
            Err(ValidationError::NegativeUsers { users: -1, .. })
        ));

        let raw = RawLocation {
            name: "  ".to_string(),
            active_users: 0,
            diseases: vec![],
            coordinates: None,
        };
        assert_eq!(
            LocationRecord::try_from(raw),
            Err(ValidationError::EmptyLocationName)
        );
    }

    #[test]
    fn test_rejects_non_finite_coordinates() {
        let raw = RawLocation {
            name: "Nowhere".to_string(),
            active_users: 0,
            diseases: vec![],
            coordinates: Some(RawCoordinates::Pair([f64::NAN, 0.0])),
        };
        assert!(matches!(
            LocationRecord::try_from(raw),
            Err(ValidationError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn test_max_counts_aggregate_without_overflow() {
        let json = r#"[
            { "name": "A", "users": 9223372036854775807, "diseases": [
                { "name": "X", "count": 9223372036854775807, "severity": "low" },
                { "name": "X", "count": 9223372036854775807, "severity": "low" }
            ]},
            { "name": "B", "users": 9223372036854775807, "diseases": [
                { "name": "X", "count": 9223372036854775807, "severity": "medium" }
            ]}
        ]"#;

        let locations = parse_locations(json).unwrap();
        assert_eq!(locations[0].diseases[0].count, i64::MAX as u64);
        assert_eq!(locations[0].total_cases(), u64::MAX - 1);

        let stats = crate::analysis::aggregate(&locations);
        assert_eq!(stats.total_disease_cases, u64::MAX);
        assert_eq!(stats.top_diseases[0].count, u64::MAX);
        assert_eq!(stats.severity_breakdown.medium, i64::MAX as u64);
        assert_eq!(crate::analysis::total_active_users(&locations), u64::MAX - 1);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_locations("{"), Err(IngestError::Parse(_))));
    }

    #[test]
    fn test_load_locations_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("locations.json");
        std::fs::write(
            &path,
            r#"[{ "name": "A", "users": 2, "diseases": [
                { "name": "X", "count": 1, "severity": "high" }
            ]}]"#,
        )
        .unwrap();

        let locations = load_locations(&path).unwrap();
        assert_eq!(locations[0].total_cases(), 1);

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_locations(&missing),
            Err(IngestError::Read { .. })
        ));
    }
}
