//! Wire-shape tests for the aggregate returned to callers.
//!
//! Downstream consumers (complaint review UI, report storage) read these as
//! JSON, so field names and the "no nulls" guarantee are part of the contract.

use chrono::Utc;
use civic_common::types::*;
use serde_json::Value;

fn sample() -> EnrichmentResult {
    EnrichmentResult {
        location: ResolvedLocation::synthetic(&Coordinates::new(12.9141, 74.856)),
        classification: ClassificationResult {
            category: "Garbage".to_string(),
            subcategory: "Overflowing Bin".to_string(),
            severity: Severity::Medium,
            confidence_percent: 82,
            provenance: Provenance::Live,
        },
        narrative: NarrativeReport {
            title: "Garbage - Overflowing Bin".to_string(),
            description: "Garbage issue detected requiring attention".to_string(),
            detailed_description: "A medium severity garbage issue has been detected.".to_string(),
            suggested_department: "Sanitation - Waste Collection".to_string(),
            safety_risk: false,
            estimated_impact: "Moderate - Scheduled maintenance needed".to_string(),
            provenance: Provenance::Synthetic,
        },
        generated_at: Utc::now(),
    }
}

fn assert_no_nulls(value: &Value, path: &str) {
    match value {
        Value::Null => panic!("null at {path}"),
        Value::Object(map) => {
            for (k, v) in map {
                assert_no_nulls(v, &format!("{path}.{k}"));
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                assert_no_nulls(v, &format!("{path}[{i}]"));
            }
        }
        _ => {}
    }
}

#[test]
fn aggregate_uses_camel_case_keys() {
    let json = serde_json::to_value(sample()).unwrap();
    assert!(json.get("generatedAt").is_some());
    assert_eq!(json["location"]["formattedAddress"], "Location at 12.914100, 74.856000");
    assert_eq!(json["location"]["placeName"], "Unknown");
    assert_eq!(json["classification"]["confidencePercent"], 82);
    assert_eq!(json["classification"]["severity"], "medium");
    assert_eq!(json["narrative"]["suggestedDepartment"], "Sanitation - Waste Collection");
    assert_eq!(json["narrative"]["safetyRisk"], false);
    assert_eq!(json["narrative"]["provenance"], "synthetic");
}

#[test]
fn aggregate_never_serializes_null() {
    let json = serde_json::to_value(sample()).unwrap();
    assert_no_nulls(&json, "$");
}

#[test]
fn aggregate_round_trips() {
    let original = sample();
    let json = serde_json::to_string(&original).unwrap();
    let back: EnrichmentResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, original);
}

#[test]
fn degraded_flag_tracks_any_synthetic_part() {
    let mut result = sample();
    assert!(result.is_degraded());

    result.location.provenance = Provenance::Live;
    result.narrative.provenance = Provenance::Live;
    assert!(!result.is_degraded());
}
