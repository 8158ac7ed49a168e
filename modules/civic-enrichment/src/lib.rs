mod attempt;
pub mod classification;
pub mod error;
pub mod location;
pub mod narrative;
pub mod orchestrator;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use classification::{ImageClassifier, SyntheticSeed};
pub use error::{EnrichmentError, ProviderError};
pub use location::LocationResolver;
pub use narrative::{NarrativeGenerator, SummaryRequest};
pub use orchestrator::EnrichmentOrchestrator;
