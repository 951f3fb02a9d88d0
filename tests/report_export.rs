use aivision_report::ingest::parse_locations;
use aivision_report::report::{decode_structured, MemorySink, TabularOptions};
use aivision_report::{
    aggregate, export_report, serialize, FixedClock, ReportEnvelope, ReportFormat,
};
use chrono::{DateTime, Utc};

const DEMO_LOCATIONS: &str = include_str!("../demos/locations.json");

fn report_date() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-02-14T16:45:30Z")
        .expect("valid date")
        .with_timezone(&Utc)
}

fn demo_envelope() -> ReportEnvelope {
    let locations = parse_locations(DEMO_LOCATIONS).expect("demo data is valid");
    ReportEnvelope::build(locations, 235, 117, 10, &FixedClock(report_date()))
}

#[test]
fn demo_data_aggregates_consistently() {
    let envelope = demo_envelope();
    let stats = &envelope.overall_stats;

    assert_eq!(stats.total_disease_cases, 117);
    assert_eq!(stats.severity_breakdown.low, 54);
    assert_eq!(stats.severity_breakdown.medium, 45);
    assert_eq!(stats.severity_breakdown.high, 18);
    assert_eq!(stats.top_diseases[0].name, "Acne Vulgaris");
    assert_eq!(stats.top_diseases[0].count, 45);
    assert_eq!(stats.top_diseases[1].name, "Eczema");
    assert_eq!(stats.top_diseases[1].count, 33);

    let locations: Vec<_> = stats
        .top_locations
        .iter()
        .map(|e| (e.name.as_str(), e.count))
        .collect();
    assert_eq!(
        locations,
        vec![("New York", 50), ("Los Angeles", 40), ("Chicago", 27)]
    );
}

#[test]
fn tabular_report_has_five_sections_in_order() {
    let csv = serialize(&demo_envelope(), ReportFormat::Tabular).expect("csv");
    let sections: Vec<&str> = csv.split("\n\n").collect();

    assert_eq!(sections.len(), 5);
    assert_eq!(
        sections[0],
        "AI Vision - Disease Analysis Report\nGenerated on: 2025-02-14"
    );
    assert_eq!(
        sections[1],
        "SUMMARY STATISTICS\nTotal Users,235\nTotal Analyses,117\nTotal Disease Cases,117"
    );
    assert_eq!(
        sections[2],
        "SEVERITY BREAKDOWN\nSeverity Level,Count,Percentage\nLow,54,46.2%\nMedium,45,38.5%\nHigh,18,15.4%"
    );
    assert!(sections[3].starts_with("TOP DISEASES\nDisease Name,Total Cases\n\"Acne Vulgaris\",45\n\"Eczema\",33\n"));

    let chicago: Vec<&str> = sections[4]
        .lines()
        .skip_while(|l| !l.starts_with("\"Chicago\""))
        .collect();
    assert_eq!(
        chicago,
        vec![
            "\"Chicago\",60,27,\"Eczema\",18,medium",
            ",,,\"Rosacea\",9,low",
        ]
    );
}

#[test]
fn structured_report_round_trips() {
    let envelope = demo_envelope();
    let json = serialize(&envelope, ReportFormat::Structured).expect("json");
    let decoded = decode_structured(&json).expect("decodes");

    assert_eq!(decoded, envelope);
    assert_eq!(decoded.overall_stats, aggregate(&decoded.location_data));
}

#[test]
fn export_uses_report_date_in_filename() {
    let sink = MemorySink::new();
    let envelope = demo_envelope();

    for format in [ReportFormat::Tabular, ReportFormat::Structured] {
        export_report(&envelope, format, &TabularOptions::default(), &sink).expect("saved");
    }

    let names: Vec<_> = sink.reports().into_iter().map(|r| r.filename).collect();
    assert_eq!(
        names,
        vec![
            "disease-analysis-report-2025-02-14.csv",
            "disease-analysis-report-2025-02-14.json",
        ]
    );
}
