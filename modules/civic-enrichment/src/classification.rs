use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use civic_common::{ClassificationResult, Provenance, Severity};
use classifier_client::ClassifierClient;

use crate::attempt::{bounded, record};
use crate::error::ProviderError;
use crate::traits::{ClassificationBackend, RawPrediction};

/// Confidence reported when the classifier omits its score.
pub const DEFAULT_CONFIDENCE_PERCENT: u8 = 75;

struct IssueClass {
    label: &'static str,
    category: &'static str,
    subcategory: &'static str,
    severity: Severity,
}

static ISSUE_CLASSES: [IssueClass; 5] = [
    IssueClass {
        label: "pothole",
        category: "Pothole",
        subcategory: "Road Surface Damage",
        severity: Severity::High,
    },
    IssueClass {
        label: "garbage",
        category: "Garbage",
        subcategory: "Overflowing Bin",
        severity: Severity::Medium,
    },
    IssueClass {
        label: "streetlight",
        category: "Street Light",
        subcategory: "Lighting Failure",
        severity: Severity::Medium,
    },
    IssueClass {
        label: "water_leak",
        category: "Water Leak",
        subcategory: "Infrastructure Leak",
        severity: Severity::Urgent,
    },
    IssueClass {
        label: "other",
        category: "Other Issue",
        subcategory: "Unidentified Issue",
        severity: Severity::Medium,
    },
];

/// Canonical label for a raw classifier label. Unknown labels map to `other`.
pub fn normalize_label(raw: &str) -> &'static str {
    let label = raw.trim().to_lowercase().replace([' ', '-'], "_");
    match label.as_str() {
        "pothole" | "potholes" => "pothole",
        "garbage" => "garbage",
        "streetlight" | "streetlights" | "street_light" | "street_lights" => "streetlight",
        "water_leak" | "leak" => "water_leak",
        _ => "other",
    }
}

fn class_for(label: &str) -> &'static IssueClass {
    ISSUE_CLASSES
        .iter()
        .find(|c| c.label == label)
        .unwrap_or(&ISSUE_CLASSES[ISSUE_CLASSES.len() - 1])
}

/// 0..1 score to a whole percentage in 0..=100.
pub fn confidence_percent(score: Option<f64>) -> u8 {
    match score {
        Some(s) if s.is_finite() => (s * 100.0).round().clamp(0.0, 100.0) as u8,
        _ => DEFAULT_CONFIDENCE_PERCENT,
    }
}

/// Map a raw prediction through the fixed table.
pub fn map_prediction(prediction: &RawPrediction) -> ClassificationResult {
    let class = class_for(normalize_label(&prediction.label));
    ClassificationResult {
        category: class.category.to_string(),
        subcategory: class.subcategory.to_string(),
        severity: class.severity,
        confidence_percent: confidence_percent(prediction.confidence),
        provenance: Provenance::Live,
    }
}

/// Randomness source for synthetic classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyntheticSeed {
    /// Thread-local entropy.
    #[default]
    Entropy,
    /// Same seed, same pick.
    Fixed(u64),
}

fn synthesize_with<R: Rng>(rng: &mut R) -> ClassificationResult {
    let class = &ISSUE_CLASSES[rng.random_range(0..ISSUE_CLASSES.len())];
    ClassificationResult {
        category: class.category.to_string(),
        subcategory: class.subcategory.to_string(),
        severity: class.severity,
        confidence_percent: rng.random_range(60..=99),
        provenance: Provenance::Synthetic,
    }
}

pub fn synthesize(seed: SyntheticSeed) -> ClassificationResult {
    match seed {
        SyntheticSeed::Entropy => synthesize_with(&mut rand::rng()),
        SyntheticSeed::Fixed(seed) => synthesize_with(&mut StdRng::seed_from_u64(seed)),
    }
}

pub struct ImageClassifier {
    backend: Arc<dyn ClassificationBackend>,
    timeout: Duration,
    seed: SyntheticSeed,
}

impl ImageClassifier {
    pub fn new(backend: Arc<dyn ClassificationBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            seed: SyntheticSeed::Entropy,
        }
    }

    pub fn with_seed(mut self, seed: SyntheticSeed) -> Self {
        self.seed = seed;
        self
    }

    /// Never fails. A dead or confused classifier yields a random table
    /// entry tagged `Synthetic`.
    pub async fn classify(&self, image: &[u8], mime_type: &str) -> ClassificationResult {
        let result = bounded(self.timeout, self.backend.predict(image, mime_type)).await;
        record(self.backend.name(), &result);

        match result {
            Ok(prediction) => {
                let classified = map_prediction(&prediction);
                info!(
                    raw = prediction.label.as_str(),
                    category = classified.category.as_str(),
                    confidence = classified.confidence_percent,
                    "Image classified"
                );
                classified
            }
            Err(_) => {
                let synthetic = synthesize(self.seed);
                warn!(
                    category = synthetic.category.as_str(),
                    "Classifier unavailable, using synthetic classification"
                );
                synthetic
            }
        }
    }
}

// --- HTTP backend ---

#[async_trait]
impl ClassificationBackend for ClassifierClient {
    fn name(&self) -> &str {
        "ml-classifier"
    }

    async fn predict(&self, image: &[u8], mime_type: &str) -> Result<RawPrediction, ProviderError> {
        let prediction = self.classify(image, mime_type).await?;
        let label = prediction
            .issue_type
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ProviderError::Unparsable("classifier reply has no issueType".to_string()))?;
        Ok(RawPrediction {
            label,
            confidence: prediction.confidence,
        })
    }
}
