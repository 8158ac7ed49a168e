use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used for every location field the pipeline could not learn.
pub const UNKNOWN: &str = "Unknown";

// --- Geo Types ---

/// Device-reported position of a submission. Input only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_meters: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: None,
        }
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.accuracy_meters = Some(meters);
        self
    }

    /// Euclidean distance in raw degrees. Only meaningful for ranking nearby
    /// candidates against each other, not as a geographic distance.
    pub fn degree_distance(&self, lat: f64, lng: f64) -> f64 {
        ((lat - self.latitude).powi(2) + (lng - self.longitude).powi(2)).sqrt()
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

// --- Provenance ---

/// Whether a sub-result came from a live provider or was synthesized locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Live,
    Synthetic,
}

impl Provenance {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Provenance::Synthetic)
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Live => write!(f, "live"),
            Provenance::Synthetic => write!(f, "synthetic"),
        }
    }
}

// --- Location ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    pub formatted_address: String,
    pub neighborhood: String,
    pub ward: String,
    pub city: String,
    pub district: String,
    pub state: String,
    pub country: String,
    pub place_name: String,
    pub provenance: Provenance,
}

impl ResolvedLocation {
    /// Final-fallback location: the coordinates themselves, everything else unknown.
    pub fn synthetic(coords: &Coordinates) -> Self {
        Self {
            formatted_address: format!("Location at {coords}"),
            neighborhood: UNKNOWN.to_string(),
            ward: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            district: UNKNOWN.to_string(),
            state: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            place_name: UNKNOWN.to_string(),
            provenance: Provenance::Synthetic,
        }
    }
}

/// Neighborhood and ward for a point, `"Unknown"` when the provider left them blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborhoodInfo {
    pub neighborhood: String,
    pub ward: String,
}

impl From<&ResolvedLocation> for NeighborhoodInfo {
    fn from(location: &ResolvedLocation) -> Self {
        fn or_unknown(value: &str) -> String {
            if value.trim().is_empty() {
                UNKNOWN.to_string()
            } else {
                value.to_string()
            }
        }
        Self {
            neighborhood: or_unknown(&location.neighborhood),
            ward: or_unknown(&location.ward),
        }
    }
}

// --- Classification ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Urgent,
}

impl Severity {
    /// High and urgent issues are treated as immediate safety hazards.
    pub fn is_safety_risk(&self) -> bool {
        matches!(self, Severity::High | Severity::Urgent)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Urgent => write!(f, "urgent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub category: String,
    pub subcategory: String,
    pub severity: Severity,
    /// Always within 0..=100.
    pub confidence_percent: u8,
    pub provenance: Provenance,
}

// --- Narrative ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeReport {
    /// At most ten words.
    pub title: String,
    pub description: String,
    pub detailed_description: String,
    pub suggested_department: String,
    pub safety_risk: bool,
    pub estimated_impact: String,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub text: String,
    pub provenance: Provenance,
}

// --- Aggregate ---

/// Everything the pipeline learned about one submission. Every sub-record is
/// always populated, live or synthetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult {
    pub location: ResolvedLocation,
    pub classification: ClassificationResult,
    pub narrative: NarrativeReport,
    pub generated_at: DateTime<Utc>,
}

impl EnrichmentResult {
    /// True when any part of the result was synthesized rather than fetched.
    pub fn is_degraded(&self) -> bool {
        self.location.provenance.is_synthetic()
            || self.classification.provenance.is_synthetic()
            || self.narrative.provenance.is_synthetic()
    }
}

// --- Provider attempts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Unavailable,
    Unparsable,
    Timeout,
    NoResult,
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptOutcome::Success => write!(f, "success"),
            AttemptOutcome::Unavailable => write!(f, "unavailable"),
            AttemptOutcome::Unparsable => write!(f, "unparsable"),
            AttemptOutcome::Timeout => write!(f, "timeout"),
            AttemptOutcome::NoResult => write!(f, "no_result"),
        }
    }
}

/// One call to one provider. Diagnostic only, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

impl ProviderAttempt {
    pub fn new(provider: impl Into<String>, outcome: AttemptOutcome) -> Self {
        Self {
            provider: provider.into(),
            outcome,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == AttemptOutcome::Success
    }
}
