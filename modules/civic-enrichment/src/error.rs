use ai_client::AiError;
use civic_common::AttemptOutcome;
use classifier_client::ClassifierError;
use geocoding_client::GeocodingError;
use thiserror::Error;

/// Why one provider attempt did not produce a usable value. Never leaves the
/// pipeline: each stage turns it into a fallback and a logged attempt.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("response unparsable: {0}")]
    Unparsable(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("no result: {0}")]
    NoResult(String),
}

impl ProviderError {
    pub fn outcome(&self) -> AttemptOutcome {
        match self {
            ProviderError::Unavailable(_) => AttemptOutcome::Unavailable,
            ProviderError::Unparsable(_) => AttemptOutcome::Unparsable,
            ProviderError::Timeout(_) => AttemptOutcome::Timeout,
            ProviderError::NoResult(_) => AttemptOutcome::NoResult,
        }
    }
}

impl From<GeocodingError> for ProviderError {
    fn from(e: GeocodingError) -> Self {
        match e {
            GeocodingError::Network(_) | GeocodingError::Api { .. } => {
                ProviderError::Unavailable(e.to_string())
            }
            GeocodingError::Timeout(_) => ProviderError::Timeout(e.to_string()),
            GeocodingError::Parse(_) => ProviderError::Unparsable(e.to_string()),
            GeocodingError::NoResults(_) => ProviderError::NoResult(e.to_string()),
        }
    }
}

impl From<ClassifierError> for ProviderError {
    fn from(e: ClassifierError) -> Self {
        match e {
            ClassifierError::Timeout(_) => ProviderError::Timeout(e.to_string()),
            ClassifierError::Parse(_) => ProviderError::Unparsable(e.to_string()),
            _ => ProviderError::Unavailable(e.to_string()),
        }
    }
}

impl From<AiError> for ProviderError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::Timeout(_) => ProviderError::Timeout(e.to_string()),
            AiError::Parse(_) | AiError::Empty(_) => ProviderError::Unparsable(e.to_string()),
            _ => ProviderError::Unavailable(e.to_string()),
        }
    }
}

/// The only way `enrich` fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("enrichment cancelled")]
    Cancelled,
}
