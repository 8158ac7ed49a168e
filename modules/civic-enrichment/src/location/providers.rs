use async_trait::async_trait;

use civic_common::{Coordinates, LocalityRule, Provenance, ResolvedLocation};
use geocoding_client::{GatewayClient, GatewayLocation, IpLocator, OpenCageClient};

use super::disambiguation;
use crate::error::ProviderError;
use crate::traits::{AddressGeocoder, LocationProvider, PositionLocator};

// --- Primary: internal gateway ---

pub struct GatewayProvider {
    client: GatewayClient,
}

impl GatewayProvider {
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }
}

/// Gateway bodies without an address are treated as unusable.
fn from_gateway(body: GatewayLocation) -> Result<ResolvedLocation, ProviderError> {
    let address = body
        .address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ProviderError::Unparsable("gateway body has no address".to_string()))?;

    let field = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
    Ok(ResolvedLocation {
        formatted_address: address,
        neighborhood: field(body.neighborhood),
        ward: field(body.ward),
        city: field(body.city),
        district: field(body.district),
        state: field(body.state),
        country: field(body.country),
        place_name: field(body.place_name),
        provenance: Provenance::Live,
    })
}

#[async_trait]
impl LocationProvider for GatewayProvider {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn reverse(&self, coords: &Coordinates) -> Result<ResolvedLocation, ProviderError> {
        let body = self
            .client
            .reverse_geocode(coords.latitude, coords.longitude)
            .await?;
        from_gateway(body)
    }
}

// --- Secondary: OpenCage with local disambiguation ---

pub struct OpenCageProvider {
    client: OpenCageClient,
    rules: Vec<LocalityRule>,
}

impl OpenCageProvider {
    pub fn new(client: OpenCageClient, rules: Vec<LocalityRule>) -> Self {
        Self { client, rules }
    }
}

#[async_trait]
impl LocationProvider for OpenCageProvider {
    fn name(&self) -> &str {
        "opencage"
    }

    async fn reverse(&self, coords: &Coordinates) -> Result<ResolvedLocation, ProviderError> {
        let candidates = self.client.reverse(coords.latitude, coords.longitude).await?;

        let selection = disambiguation::select(&candidates, coords, &self.rules)
            .ok_or_else(|| ProviderError::NoResult(format!("no candidate for {coords}")))?;
        if let Some(rule) = selection.rule {
            tracing::debug!(rule = rule.name.as_str(), "Locality rule picked the candidate");
        }

        let location = disambiguation::extract(selection);
        if location.formatted_address.is_empty() {
            return Err(ProviderError::Unparsable(
                "selected candidate has no formatted address".to_string(),
            ));
        }
        Ok(location)
    }
}

#[async_trait]
impl AddressGeocoder for OpenCageProvider {
    async fn forward(&self, address: &str) -> Result<Coordinates, ProviderError> {
        let best = self.client.forward(address).await?;
        let geometry = best
            .geometry
            .ok_or_else(|| ProviderError::Unparsable(format!("match for {address:?} has no geometry")))?;
        Ok(Coordinates::new(geometry.lat, geometry.lng))
    }
}

// --- Tertiary: IP geolocation ---

pub struct IpPositionLocator {
    locator: IpLocator,
}

impl IpPositionLocator {
    pub fn new(locator: IpLocator) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl PositionLocator for IpPositionLocator {
    fn name(&self) -> &str {
        "ip-geolocation"
    }

    async fn locate(&self) -> Result<Coordinates, ProviderError> {
        let (lat, lng) = self.locator.locate().await?;
        Ok(Coordinates::new(lat, lng))
    }
}
