// Trait seams for the three unreliable external capabilities.
//
// LocationProvider / AddressGeocoder / PositionLocator cover geocoding,
// ClassificationBackend the image classifier, NarrativeBackend the
// generative model. Each stage owns `Arc<dyn Trait>` handles, so tests swap
// in the mocks from `testing` with no network.
//
// Implementations return `ProviderError`; the stages never let it escape.

use async_trait::async_trait;

use civic_common::{Coordinates, ResolvedLocation};

use crate::error::ProviderError;

// ---------------------------------------------------------------------------
// Geocoding
// ---------------------------------------------------------------------------

/// One step of the reverse-geocoding chain.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Stable name used in attempt records and logs.
    fn name(&self) -> &str;

    /// Reverse-geocode to a live address. Any error advances the chain.
    async fn reverse(&self, coords: &Coordinates) -> Result<ResolvedLocation, ProviderError>;
}

/// Free-text address to coordinates.
#[async_trait]
pub trait AddressGeocoder: Send + Sync {
    async fn forward(&self, address: &str) -> Result<Coordinates, ProviderError>;
}

/// Coarse position of the caller's network origin. Yields coordinates only.
#[async_trait]
pub trait PositionLocator: Send + Sync {
    fn name(&self) -> &str;

    async fn locate(&self) -> Result<Coordinates, ProviderError>;
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Label and score as reported by the classifier, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub label: String,
    /// 0..1 when present.
    pub confidence: Option<f64>,
}

#[async_trait]
pub trait ClassificationBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn predict(&self, image: &[u8], mime_type: &str) -> Result<RawPrediction, ProviderError>;
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

#[async_trait]
pub trait NarrativeBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Ask for a structured narrative about an image. The reply must parse as
    /// [`crate::narrative::NarrativeDraft`].
    async fn draft(
        &self,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<crate::narrative::NarrativeDraft, ProviderError>;

    /// Plain text completion.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}
