use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ai_client::{truncate_to_char_boundary, Gemini};
use civic_common::{
    ClassificationResult, NarrativeReport, Provenance, ReportSummary, Severity,
};

use crate::attempt::{bounded, record};
use crate::error::ProviderError;
use crate::traits::NarrativeBackend;

/// Titles longer than this many words are cut down.
pub const MAX_TITLE_WORDS: usize = 10;

/// Department used when a category has no entry in the routing table.
pub const DEFAULT_DEPARTMENT: &str = "Public Works";

const DEPARTMENTS: &[(&str, &str)] = &[
    ("Pothole", "Public Works - Road Maintenance"),
    ("Garbage", "Sanitation - Waste Collection"),
    ("Street Light", "Utilities - Street Lighting Division"),
    ("Water Leak", "Water Management - Infrastructure"),
    ("Road Infrastructure", "Public Works - Road Maintenance"),
    ("Street Lighting", "Utilities - Street Lighting Division"),
    ("Waste Management", "Sanitation - Waste Collection"),
    ("Traffic Safety", "Transportation - Traffic Management"),
    ("Water & Drainage", "Water Management - Infrastructure"),
    ("Parks & Recreation", "Parks & Recreation Department"),
];

pub fn department_for(category: &str) -> &'static str {
    DEPARTMENTS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, d)| *d)
        .unwrap_or(DEFAULT_DEPARTMENT)
}

/// Exact reply shape requested from the generative model.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeDraft {
    pub category: String,
    pub subcategory: String,
    pub severity: String,
    pub confidence: f64,
    /// Brief technical description of the issue seen in the image.
    pub description: String,
    pub suggested_department: String,
    /// Concise, specific issue title (max 10 words).
    pub title: String,
    /// Two or three sentences: visible details, safety concerns, community impact.
    pub detailed_description: String,
    /// True if the issue is an immediate safety hazard.
    pub safety_risk: bool,
    pub estimated_impact: String,
}

fn narrative_prompt(c: &ClassificationResult) -> String {
    format!(
        r#"You are analyzing a civic infrastructure issue that has been classified by an ML model.

ML Classification Results:
- Category: {category}
- Subcategory: {subcategory}
- Severity: {severity}
- Confidence: {confidence}%

Based on the image and ML classification, generate a report as a JSON object with exactly these keys:
{{
  "category": "{category}",
  "subcategory": "{subcategory}",
  "severity": "{severity}",
  "confidence": {confidence},
  "description": "brief technical description of the issue seen in the image",
  "suggestedDepartment": "responsible municipal department",
  "title": "concise, specific issue title (max 10 words)",
  "detailedDescription": "comprehensive 2-3 sentence description including specific details visible in the image, safety concerns, and community impact",
  "safetyRisk": true or false (true if immediate safety hazard),
  "estimatedImpact": "community impact assessment"
}}

Provide accurate, specific details based on what you see in the image. Verify the ML classification is correct."#,
        category = c.category,
        subcategory = c.subcategory,
        severity = c.severity,
        confidence = c.confidence_percent,
    )
}

fn truncate_title(title: &str) -> String {
    title
        .split_whitespace()
        .take(MAX_TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check a model draft and turn it into a live report. Blank text fields make
/// the whole draft unusable.
pub fn validate_draft(draft: NarrativeDraft) -> Result<NarrativeReport, ProviderError> {
    let required = [
        ("title", &draft.title),
        ("description", &draft.description),
        ("detailedDescription", &draft.detailed_description),
        ("suggestedDepartment", &draft.suggested_department),
        ("estimatedImpact", &draft.estimated_impact),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(ProviderError::Unparsable(format!("draft has blank {field}")));
    }

    Ok(NarrativeReport {
        title: truncate_title(&draft.title),
        description: draft.description.trim().to_string(),
        detailed_description: draft.detailed_description.trim().to_string(),
        suggested_department: draft.suggested_department.trim().to_string(),
        safety_risk: draft.safety_risk,
        estimated_impact: draft.estimated_impact.trim().to_string(),
        provenance: Provenance::Live,
    })
}

/// Deterministic narrative built from the classification alone.
pub fn synthesize(c: &ClassificationResult) -> NarrativeReport {
    NarrativeReport {
        title: truncate_title(&format!("{} - {}", c.category, c.subcategory)),
        description: format!("{} issue detected requiring attention", c.category),
        detailed_description: format!(
            "A {} severity {} issue has been detected. Immediate assessment and appropriate action required to address this {} problem.",
            c.severity,
            c.category.to_lowercase(),
            c.subcategory.to_lowercase()
        ),
        suggested_department: department_for(&c.category).to_string(),
        safety_risk: c.severity.is_safety_risk(),
        estimated_impact: match c.severity {
            Severity::Urgent => "High - Immediate action required",
            _ => "Moderate - Scheduled maintenance needed",
        }
        .to_string(),
        provenance: Provenance::Synthetic,
    }
}

/// Input for a municipal report summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub category: String,
    pub location: String,
    pub image_count: u32,
    #[serde(default)]
    pub narrative: Option<NarrativeReport>,
}

fn summary_prompt(request: &SummaryRequest) -> String {
    let analysis = request
        .narrative
        .as_ref()
        .and_then(|n| serde_json::to_string(n).ok())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "Generate a professional civic issue report summary based on:
Category: {}
Location: {}
Number of images: {}
AI Analysis: {}

Create a concise, formal summary for municipal authorities including:
1. Issue overview
2. Location and severity
3. Recommended action
4. Priority justification

Keep it under 150 words, professional tone.",
        request.category, request.location, request.image_count, analysis
    )
}

pub fn fallback_summary(request: &SummaryRequest) -> ReportSummary {
    ReportSummary {
        text: format!(
            "Issue reported in {} at {}. {} photo(s) submitted for review. Awaiting municipal assessment and action.",
            request.category, request.location, request.image_count
        ),
        provenance: Provenance::Synthetic,
    }
}

pub struct NarrativeGenerator {
    backend: Option<Arc<dyn NarrativeBackend>>,
    timeout: Duration,
}

impl NarrativeGenerator {
    pub fn new(backend: Option<Arc<dyn NarrativeBackend>>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Never fails. Without a backend, or when the model's reply does not
    /// validate, the report is synthesized from the classification.
    pub async fn generate(
        &self,
        classification: &ClassificationResult,
        image: &[u8],
        mime_type: &str,
    ) -> NarrativeReport {
        let Some(backend) = &self.backend else {
            debug!("No narrative backend configured");
            return synthesize(classification);
        };

        let prompt = narrative_prompt(classification);
        let result = bounded(self.timeout, async {
            validate_draft(backend.draft(&prompt, image, mime_type).await?)
        })
        .await;
        record(backend.name(), &result);

        match result {
            Ok(report) => {
                info!(title = report.title.as_str(), "Narrative generated");
                report
            }
            Err(_) => {
                warn!(
                    category = classification.category.as_str(),
                    "Narrative unavailable, synthesizing from classification"
                );
                synthesize(classification)
            }
        }
    }

    pub async fn summarize(&self, request: &SummaryRequest) -> ReportSummary {
        let Some(backend) = &self.backend else {
            return fallback_summary(request);
        };

        let prompt = summary_prompt(request);
        let result = bounded(self.timeout, backend.complete(&prompt)).await;
        record(backend.name(), &result);

        match result {
            Ok(text) if !text.trim().is_empty() => {
                debug!(preview = truncate_to_char_boundary(&text, 120), "Summary generated");
                ReportSummary {
                    text: text.trim().to_string(),
                    provenance: Provenance::Live,
                }
            }
            _ => fallback_summary(request),
        }
    }
}

// --- Gemini backend ---

#[async_trait]
impl NarrativeBackend for Gemini {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn draft(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<NarrativeDraft, ProviderError> {
        Ok(self
            .extract_from_image::<NarrativeDraft>(image, mime_type, prompt)
            .await?)
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        Ok(self.generate_text(prompt).await?)
    }
}
