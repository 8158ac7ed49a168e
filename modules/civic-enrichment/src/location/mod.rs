pub mod disambiguation;
pub mod providers;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use civic_common::{
    AttemptOutcome, Coordinates, NeighborhoodInfo, ProviderAttempt, ResolvedLocation,
};

use crate::attempt::{bounded, record};
use crate::traits::{AddressGeocoder, LocationProvider, PositionLocator};

pub use providers::{GatewayProvider, IpPositionLocator, OpenCageProvider};

/// Longest address accepted for forward geocoding.
pub const MAX_ADDRESS_LEN: usize = 200;

/// Coordinates → address through an ordered provider chain. Never fails:
/// when every provider gives up the result is a synthetic
/// `"Location at {lat}, {lon}"` record.
pub struct LocationResolver {
    providers: Vec<Arc<dyn LocationProvider>>,
    forward: Option<Arc<dyn AddressGeocoder>>,
    locator: Option<Arc<dyn PositionLocator>>,
    timeout: Duration,
    detection_timeout: Duration,
}

impl LocationResolver {
    pub fn new(timeout: Duration, detection_timeout: Duration) -> Self {
        Self {
            providers: Vec::new(),
            forward: None,
            locator: None,
            timeout,
            detection_timeout,
        }
    }

    /// Append a reverse-geocoding step. Steps run in the order added.
    pub fn provider(mut self, provider: Arc<dyn LocationProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn forward_geocoder(mut self, geocoder: Arc<dyn AddressGeocoder>) -> Self {
        self.forward = Some(geocoder);
        self
    }

    /// Coordinates-only step tried after every address provider.
    pub fn position_locator(mut self, locator: Arc<dyn PositionLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    pub async fn resolve(&self, coords: &Coordinates) -> ResolvedLocation {
        self.resolve_with_attempts(coords).await.0
    }

    /// Same as [`resolve`](Self::resolve), plus one attempt record per
    /// provider call in the order they ran.
    pub async fn resolve_with_attempts(
        &self,
        coords: &Coordinates,
    ) -> (ResolvedLocation, Vec<ProviderAttempt>) {
        let mut attempts = Vec::with_capacity(self.providers.len() + 1);

        for provider in &self.providers {
            let result = bounded(self.timeout, provider.reverse(coords)).await;
            attempts.push(record(provider.name(), &result));
            if let Ok(location) = result {
                info!(
                    provider = provider.name(),
                    city = location.city.as_str(),
                    "Location resolved"
                );
                return (location, attempts);
            }
        }

        // An IP position cannot name a street, so even a successful lookup
        // ends the chain with the synthetic record.
        if let Some(locator) = &self.locator {
            let result = bounded(self.detection_timeout, locator.locate()).await;
            let attempt = match &result {
                Ok(position) => {
                    info!(
                        provider = locator.name(),
                        position = %position,
                        "IP position found but carries no address"
                    );
                    ProviderAttempt::new(locator.name(), AttemptOutcome::NoResult)
                }
                Err(_) => record(locator.name(), &result),
            };
            attempts.push(attempt);
        }

        warn!(coords = %coords, "All location providers failed, using coordinates");
        (ResolvedLocation::synthetic(coords), attempts)
    }

    /// Forward-geocode a free-text address. `None` when no geocoder is
    /// configured, the input is blank or too long, or the lookup fails.
    pub async fn geocode(&self, address: &str) -> Option<Coordinates> {
        let address = address.trim();
        if address.is_empty() || address.chars().count() > MAX_ADDRESS_LEN {
            warn!(len = address.len(), "Rejected address for geocoding");
            return None;
        }
        let geocoder = self.forward.as_ref()?;

        let result = bounded(self.timeout, geocoder.forward(address)).await;
        record("forward-geocode", &result);
        result.ok()
    }

    pub async fn neighborhood_info(&self, coords: &Coordinates) -> NeighborhoodInfo {
        NeighborhoodInfo::from(&self.resolve(coords).await)
    }

    /// Best-guess position for callers without device coordinates.
    pub async fn detect_position(&self) -> Option<Coordinates> {
        let locator = self.locator.as_ref()?;
        let result = bounded(self.detection_timeout, locator.locate()).await;
        record(locator.name(), &result);
        result.ok()
    }
}
