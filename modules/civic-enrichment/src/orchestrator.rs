use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use civic_common::{Coordinates, EnrichmentResult};

use crate::classification::ImageClassifier;
use crate::error::EnrichmentError;
use crate::location::LocationResolver;
use crate::narrative::NarrativeGenerator;

/// Runs location resolution alongside the classify-then-narrate chain and
/// assembles one result. Holds no per-call state; share it behind an `Arc`.
pub struct EnrichmentOrchestrator {
    location: Arc<LocationResolver>,
    classifier: Arc<ImageClassifier>,
    narrative: Arc<NarrativeGenerator>,
}

impl EnrichmentOrchestrator {
    pub fn new(
        location: Arc<LocationResolver>,
        classifier: Arc<ImageClassifier>,
        narrative: Arc<NarrativeGenerator>,
    ) -> Self {
        Self {
            location,
            classifier,
            narrative,
        }
    }

    pub fn location(&self) -> &LocationResolver {
        &self.location
    }

    pub fn narrative(&self) -> &NarrativeGenerator {
        &self.narrative
    }

    /// Enrich one submission. Provider failures are absorbed into synthetic
    /// sub-results; the only error is cancellation, which drops every
    /// in-flight call and returns no partial result.
    pub async fn enrich(
        &self,
        image: &[u8],
        mime_type: &str,
        coords: &Coordinates,
        cancel: &CancellationToken,
    ) -> Result<EnrichmentResult, EnrichmentError> {
        if cancel.is_cancelled() {
            return Err(EnrichmentError::Cancelled);
        }

        let span = info_span!("enrich", id = %Uuid::new_v4(), coords = %coords);

        let work = async {
            let location_branch = self.location.resolve(coords);
            let content_branch = async {
                let classification = self.classifier.classify(image, mime_type).await;
                if cancel.is_cancelled() {
                    return None;
                }
                let narrative = self.narrative.generate(&classification, image, mime_type).await;
                Some((classification, narrative))
            };

            let (location, content) = tokio::join!(location_branch, content_branch);
            content.map(|(classification, narrative)| (location, classification, narrative))
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            done = work.instrument(span.clone()) => done,
        };

        let Some((location, classification, narrative)) = outcome else {
            span.in_scope(|| info!("Enrichment cancelled"));
            return Err(EnrichmentError::Cancelled);
        };

        let result = EnrichmentResult {
            location,
            classification,
            narrative,
            generated_at: Utc::now(),
        };
        span.in_scope(|| {
            info!(
                category = result.classification.category.as_str(),
                degraded = result.is_degraded(),
                "Enrichment complete"
            )
        });
        Ok(result)
    }
}
