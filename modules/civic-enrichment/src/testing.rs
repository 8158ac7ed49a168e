// Test mocks for the enrichment pipeline.
//
// One mock per trait seam:
// - MockLocationProvider (LocationProvider) — fixed location or failure
// - MockGeocoder (AddressGeocoder) — fixed coordinates or failure
// - MockLocator (PositionLocator) — fixed position or failure
// - MockClassifier (ClassificationBackend) — fixed prediction or failure
// - MockNarrative (NarrativeBackend) — fixed draft/summary or failure
//
// Every mock can share a CallLog so tests can assert on call order, and can
// be told to hang so timeouts and cancellation are testable with paused time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use civic_common::{Coordinates, Provenance, ResolvedLocation};

use crate::error::ProviderError;
use crate::narrative::NarrativeDraft;
use crate::traits::{
    AddressGeocoder, ClassificationBackend, LocationProvider, NarrativeBackend, PositionLocator,
    RawPrediction,
};

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// Names of mocks in the order they were called.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, name: &str) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(name.to_string());
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

/// How a mock should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Unavailable,
    Unparsable,
    NoResult,
    /// Never answer; only a timeout or cancellation ends the call.
    Hang,
}

enum Behavior<T> {
    Reply(T),
    Fail(MockFailure),
}

struct Mock<T> {
    name: String,
    behavior: Behavior<T>,
    delay: Option<Duration>,
    log: Option<CallLog>,
}

impl<T: Clone> Mock<T> {
    fn new(name: &str, behavior: Behavior<T>) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            delay: None,
            log: None,
        }
    }

    async fn call(&self) -> Result<T, ProviderError> {
        if let Some(log) = &self.log {
            log.push(&self.name);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.behavior {
            Behavior::Reply(value) => Ok(value.clone()),
            Behavior::Fail(MockFailure::Hang) => std::future::pending().await,
            Behavior::Fail(MockFailure::Unavailable) => Err(ProviderError::Unavailable(format!(
                "{}: connection refused",
                self.name
            ))),
            Behavior::Fail(MockFailure::Unparsable) => Err(ProviderError::Unparsable(format!(
                "{}: malformed body",
                self.name
            ))),
            Behavior::Fail(MockFailure::NoResult) => {
                Err(ProviderError::NoResult(format!("{}: nothing found", self.name)))
            }
        }
    }
}

macro_rules! mock_builders {
    ($ty:ident) => {
        impl $ty {
            /// Sleep this long before answering.
            pub fn after(mut self, delay: Duration) -> Self {
                self.0.delay = Some(delay);
                self
            }

            pub fn logging(mut self, log: &CallLog) -> Self {
                self.0.log = Some(log.clone());
                self
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Geocoding mocks
// ---------------------------------------------------------------------------

pub struct MockLocationProvider(Mock<ResolvedLocation>);

impl MockLocationProvider {
    pub fn returns(name: &str, location: ResolvedLocation) -> Self {
        Self(Mock::new(name, Behavior::Reply(location)))
    }

    pub fn fails(name: &str, failure: MockFailure) -> Self {
        Self(Mock::new(name, Behavior::Fail(failure)))
    }
}

mock_builders!(MockLocationProvider);

#[async_trait]
impl LocationProvider for MockLocationProvider {
    fn name(&self) -> &str {
        &self.0.name
    }

    async fn reverse(&self, _coords: &Coordinates) -> Result<ResolvedLocation, ProviderError> {
        self.0.call().await
    }
}

pub struct MockGeocoder(Mock<Coordinates>);

impl MockGeocoder {
    pub fn returns(coords: Coordinates) -> Self {
        Self(Mock::new("forward-geocode", Behavior::Reply(coords)))
    }

    pub fn fails(failure: MockFailure) -> Self {
        Self(Mock::new("forward-geocode", Behavior::Fail(failure)))
    }
}

mock_builders!(MockGeocoder);

#[async_trait]
impl AddressGeocoder for MockGeocoder {
    async fn forward(&self, _address: &str) -> Result<Coordinates, ProviderError> {
        self.0.call().await
    }
}

pub struct MockLocator(Mock<Coordinates>);

impl MockLocator {
    pub fn returns(coords: Coordinates) -> Self {
        Self(Mock::new("ip-geolocation", Behavior::Reply(coords)))
    }

    pub fn fails(failure: MockFailure) -> Self {
        Self(Mock::new("ip-geolocation", Behavior::Fail(failure)))
    }
}

mock_builders!(MockLocator);

#[async_trait]
impl PositionLocator for MockLocator {
    fn name(&self) -> &str {
        &self.0.name
    }

    async fn locate(&self) -> Result<Coordinates, ProviderError> {
        self.0.call().await
    }
}

// ---------------------------------------------------------------------------
// Classification mock
// ---------------------------------------------------------------------------

pub struct MockClassifier(Mock<RawPrediction>);

impl MockClassifier {
    pub fn returns(label: &str, confidence: Option<f64>) -> Self {
        Self(Mock::new(
            "classifier",
            Behavior::Reply(RawPrediction {
                label: label.to_string(),
                confidence,
            }),
        ))
    }

    pub fn fails(failure: MockFailure) -> Self {
        Self(Mock::new("classifier", Behavior::Fail(failure)))
    }
}

mock_builders!(MockClassifier);

#[async_trait]
impl ClassificationBackend for MockClassifier {
    fn name(&self) -> &str {
        &self.0.name
    }

    async fn predict(&self, _image: &[u8], _mime_type: &str) -> Result<RawPrediction, ProviderError> {
        self.0.call().await
    }
}

// ---------------------------------------------------------------------------
// Narrative mock
// ---------------------------------------------------------------------------

/// Answers `draft` per its behavior; `complete` answers with the configured
/// summary text, or fails the same way when none is set.
pub struct MockNarrative {
    draft: Mock<NarrativeDraft>,
    summary: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockNarrative {
    pub fn returns(draft: NarrativeDraft) -> Self {
        Self {
            draft: Mock::new("narrative", Behavior::Reply(draft)),
            summary: None,
            prompts: Arc::default(),
        }
    }

    pub fn fails(failure: MockFailure) -> Self {
        Self {
            draft: Mock::new("narrative", Behavior::Fail(failure)),
            summary: None,
            prompts: Arc::default(),
        }
    }

    pub fn with_summary(mut self, text: &str) -> Self {
        self.summary = Some(text.to_string());
        self
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.draft.delay = Some(delay);
        self
    }

    pub fn logging(mut self, log: &CallLog) -> Self {
        self.draft.log = Some(log.clone());
        self
    }

    /// Every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn remember(&self, prompt: &str) {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
    }
}

#[async_trait]
impl NarrativeBackend for MockNarrative {
    fn name(&self) -> &str {
        &self.draft.name
    }

    async fn draft(
        &self,
        prompt: &str,
        _image: &[u8],
        _mime_type: &str,
    ) -> Result<NarrativeDraft, ProviderError> {
        self.remember(prompt);
        self.draft.call().await
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.remember(prompt);
        match &self.summary {
            Some(text) => Ok(text.clone()),
            None => Err(ProviderError::Unavailable("narrative: no summary configured".to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Hampankatta, Mangaluru.
pub const HAMPANKATTA: (f64, f64) = (12.8698, 74.8430);
/// Coordinates used by the all-providers-down fixture.
pub const MANGALURU_CENTRE: (f64, f64) = (12.9141, 74.856);

pub fn live_location(city: &str) -> ResolvedLocation {
    ResolvedLocation {
        formatted_address: format!("Car Street, {city}, Karnataka, India"),
        neighborhood: "Car Street".to_string(),
        ward: "Ward 27".to_string(),
        city: city.to_string(),
        district: "Dakshina Kannada".to_string(),
        state: "Karnataka".to_string(),
        country: "India".to_string(),
        place_name: "Car Street".to_string(),
        provenance: Provenance::Live,
    }
}

pub fn pothole_draft() -> NarrativeDraft {
    NarrativeDraft {
        category: "Pothole".to_string(),
        subcategory: "Road Surface Damage".to_string(),
        severity: "high".to_string(),
        confidence: 91.0,
        description: "Deep pothole in the left lane".to_string(),
        suggested_department: "Public Works - Road Maintenance".to_string(),
        title: "Deep pothole near Hampankatta bus stop".to_string(),
        detailed_description: "A pothole about half a metre wide with exposed aggregate. Two-wheelers swerve into traffic to avoid it.".to_string(),
        safety_risk: true,
        estimated_impact: "High - affects a busy bus corridor".to_string(),
    }
}
