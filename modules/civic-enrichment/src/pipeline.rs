use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use ai_client::Gemini;
use civic_common::Config;
use classifier_client::ClassifierClient;
use geocoding_client::{GatewayClient, IpLocator, OpenCageClient};

use crate::classification::ImageClassifier;
use crate::location::{GatewayProvider, IpPositionLocator, LocationResolver, OpenCageProvider};
use crate::narrative::NarrativeGenerator;
use crate::orchestrator::EnrichmentOrchestrator;
use crate::traits::NarrativeBackend;

const USER_AGENT: &str = concat!("civic-enrichment/", env!("CARGO_PKG_VERSION"));

/// Build the live resolver chain from configuration. Providers whose
/// configuration is absent are left out.
pub fn location_resolver(config: &Config, http: &reqwest::Client) -> LocationResolver {
    let mut resolver = LocationResolver::new(config.provider_timeout, config.detection_timeout);

    if let Some(url) = &config.gateway_url {
        resolver = resolver.provider(Arc::new(GatewayProvider::new(
            GatewayClient::new(url).with_client(http.clone()),
        )));
    }

    if let Some(key) = &config.geocoding_api_key {
        let client = OpenCageClient::new(key)
            .with_base_url(&config.opencage_base_url)
            .with_region(&config.geocoding_country_code, &config.geocoding_bounds)
            .with_client(http.clone());
        let opencage = Arc::new(OpenCageProvider::new(client, config.locality_rules.clone()));
        resolver = resolver.provider(opencage.clone()).forward_geocoder(opencage);
    }

    if let Some(url) = &config.ip_geolocation_url {
        resolver = resolver.position_locator(Arc::new(IpPositionLocator::new(
            IpLocator::with_url(url).with_client(http.clone()),
        )));
    }

    resolver
}

/// Wire every stage from configuration, sharing one connection pool.
pub fn from_config(config: &Config) -> Result<EnrichmentOrchestrator> {
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(config.provider_timeout)
        .build()?;

    let location = location_resolver(config, &http);

    let classifier = ImageClassifier::new(
        Arc::new(ClassifierClient::new(&config.ml_service_url).with_client(http.clone())),
        config.provider_timeout,
    );

    let narrative_backend: Option<Arc<dyn NarrativeBackend>> =
        config.gemini_api_key.as_ref().map(|key| {
            Arc::new(
                Gemini::new(key.clone(), config.gemini_model.clone())
                    .with_base_url(config.gemini_base_url.clone())
                    .with_client(http.clone()),
            ) as Arc<dyn NarrativeBackend>
        });
    let narrative = NarrativeGenerator::new(narrative_backend, config.provider_timeout);

    info!(
        gateway = config.gateway_url.is_some(),
        opencage = config.geocoding_api_key.is_some(),
        ip_lookup = config.ip_geolocation_url.is_some(),
        gemini = config.gemini_api_key.is_some(),
        "Enrichment pipeline ready"
    );

    Ok(EnrichmentOrchestrator::new(
        Arc::new(location),
        Arc::new(classifier),
        Arc::new(narrative),
    ))
}
