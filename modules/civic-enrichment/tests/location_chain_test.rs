use std::sync::Arc;
use std::time::Duration;

use civic_common::{AttemptOutcome, Coordinates, Provenance, UNKNOWN};
use civic_enrichment::location::LocationResolver;
use civic_enrichment::testing::{
    live_location, CallLog, MockFailure, MockGeocoder, MockLocationProvider, MockLocator,
    MANGALURU_CENTRE,
};

const TIMEOUT: Duration = Duration::from_secs(10);
const DETECTION: Duration = Duration::from_secs(5);

fn centre() -> Coordinates {
    Coordinates::new(MANGALURU_CENTRE.0, MANGALURU_CENTRE.1)
}

fn outcomes(attempts: &[civic_common::ProviderAttempt]) -> Vec<(String, AttemptOutcome)> {
    attempts
        .iter()
        .map(|a| (a.provider.clone(), a.outcome))
        .collect()
}

#[tokio::test]
async fn primary_success_stops_the_chain() {
    let log = CallLog::new();
    let resolver = LocationResolver::new(TIMEOUT, DETECTION)
        .provider(Arc::new(
            MockLocationProvider::returns("gateway", live_location("Mangaluru")).logging(&log),
        ))
        .provider(Arc::new(
            MockLocationProvider::returns("opencage", live_location("Udupi")).logging(&log),
        ));

    let (location, attempts) = resolver.resolve_with_attempts(&centre()).await;

    assert_eq!(location.city, "Mangaluru");
    assert_eq!(location.provenance, Provenance::Live);
    assert_eq!(log.calls(), vec!["gateway"]);
    assert_eq!(outcomes(&attempts), vec![("gateway".to_string(), AttemptOutcome::Success)]);
}

#[tokio::test]
async fn failure_advances_to_secondary() {
    let log = CallLog::new();
    let resolver = LocationResolver::new(TIMEOUT, DETECTION)
        .provider(Arc::new(
            MockLocationProvider::fails("gateway", MockFailure::Unparsable).logging(&log),
        ))
        .provider(Arc::new(
            MockLocationProvider::returns("opencage", live_location("Mangaluru")).logging(&log),
        ));

    let (location, attempts) = resolver.resolve_with_attempts(&centre()).await;

    assert_eq!(location.city, "Mangaluru");
    assert_eq!(log.calls(), vec!["gateway", "opencage"]);
    assert_eq!(
        outcomes(&attempts),
        vec![
            ("gateway".to_string(), AttemptOutcome::Unparsable),
            ("opencage".to_string(), AttemptOutcome::Success),
        ]
    );
}

#[tokio::test]
async fn all_providers_down_yields_coordinate_address() {
    let log = CallLog::new();
    let resolver = LocationResolver::new(TIMEOUT, DETECTION)
        .provider(Arc::new(
            MockLocationProvider::fails("gateway", MockFailure::Unavailable).logging(&log),
        ))
        .provider(Arc::new(
            MockLocationProvider::fails("opencage", MockFailure::NoResult).logging(&log),
        ))
        .position_locator(Arc::new(MockLocator::fails(MockFailure::Unavailable).logging(&log)));

    let (location, attempts) = resolver.resolve_with_attempts(&centre()).await;

    assert_eq!(location.formatted_address, "Location at 12.914100, 74.856000");
    for field in [
        &location.neighborhood,
        &location.ward,
        &location.city,
        &location.district,
        &location.state,
        &location.country,
        &location.place_name,
    ] {
        assert_eq!(field, UNKNOWN);
    }
    assert_eq!(location.provenance, Provenance::Synthetic);
    assert_eq!(log.calls(), vec!["gateway", "opencage", "ip-geolocation"]);
    assert_eq!(attempts.len(), 3);
    assert!(attempts.iter().all(|a| !a.succeeded()));
}

#[tokio::test]
async fn ip_position_is_recorded_as_no_result() {
    let resolver = LocationResolver::new(TIMEOUT, DETECTION)
        .provider(Arc::new(MockLocationProvider::fails("gateway", MockFailure::Unavailable)))
        .position_locator(Arc::new(MockLocator::returns(Coordinates::new(12.87, 74.88))));

    let (location, attempts) = resolver.resolve_with_attempts(&centre()).await;

    assert_eq!(location.provenance, Provenance::Synthetic);
    assert_eq!(
        outcomes(&attempts),
        vec![
            ("gateway".to_string(), AttemptOutcome::Unavailable),
            ("ip-geolocation".to_string(), AttemptOutcome::NoResult),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn hanging_provider_is_cut_off_and_chain_advances() {
    let resolver = LocationResolver::new(TIMEOUT, DETECTION)
        .provider(Arc::new(MockLocationProvider::fails("gateway", MockFailure::Hang)))
        .provider(Arc::new(MockLocationProvider::returns(
            "opencage",
            live_location("Mangaluru"),
        )));

    let started = tokio::time::Instant::now();
    let (location, attempts) = resolver.resolve_with_attempts(&centre()).await;

    assert_eq!(location.city, "Mangaluru");
    assert_eq!(attempts[0].outcome, AttemptOutcome::Timeout);
    assert_eq!(attempts[1].outcome, AttemptOutcome::Success);
    assert!(started.elapsed() >= TIMEOUT);
    assert!(started.elapsed() < TIMEOUT * 2);
}

#[tokio::test]
async fn no_providers_configured_is_synthetic() {
    let resolver = LocationResolver::new(TIMEOUT, DETECTION);
    let (location, attempts) = resolver.resolve_with_attempts(&Coordinates::new(-1.5, 2.25)).await;
    assert_eq!(location.formatted_address, "Location at -1.500000, 2.250000");
    assert!(attempts.is_empty());
}

#[tokio::test]
async fn neighborhood_info_maps_blanks_to_unknown() {
    let mut location = live_location("Mangaluru");
    location.ward = String::new();
    let resolver = LocationResolver::new(TIMEOUT, DETECTION)
        .provider(Arc::new(MockLocationProvider::returns("gateway", location)));

    let info = resolver.neighborhood_info(&centre()).await;
    assert_eq!(info.neighborhood, "Car Street");
    assert_eq!(info.ward, UNKNOWN);
}

#[tokio::test]
async fn geocode_rejects_blank_and_oversized_input_without_calling() {
    let log = CallLog::new();
    let resolver = LocationResolver::new(TIMEOUT, DETECTION).forward_geocoder(Arc::new(
        MockGeocoder::returns(Coordinates::new(12.87, 74.84)).logging(&log),
    ));

    assert!(resolver.geocode("   ").await.is_none());
    assert!(resolver.geocode(&"a".repeat(201)).await.is_none());
    assert!(log.calls().is_empty());

    let found = resolver.geocode("Hampankatta, Mangaluru").await.unwrap();
    assert_eq!(found, Coordinates::new(12.87, 74.84));
    assert_eq!(log.calls().len(), 1);
}

#[tokio::test]
async fn geocode_failure_or_missing_geocoder_is_none() {
    let failing = LocationResolver::new(TIMEOUT, DETECTION)
        .forward_geocoder(Arc::new(MockGeocoder::fails(MockFailure::NoResult)));
    assert!(failing.geocode("Nowhere Street").await.is_none());

    let unconfigured = LocationResolver::new(TIMEOUT, DETECTION);
    assert!(unconfigured.geocode("Car Street").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn detect_position_uses_the_short_timeout() {
    let resolver = LocationResolver::new(TIMEOUT, DETECTION)
        .position_locator(Arc::new(MockLocator::fails(MockFailure::Hang)));

    let started = tokio::time::Instant::now();
    assert!(resolver.detect_position().await.is_none());
    assert!(started.elapsed() >= DETECTION);
    assert!(started.elapsed() < TIMEOUT);
}

#[tokio::test]
async fn detect_position_returns_coordinates() {
    let resolver = LocationResolver::new(TIMEOUT, DETECTION)
        .position_locator(Arc::new(MockLocator::returns(Coordinates::new(12.87, 74.88))));
    assert_eq!(resolver.detect_position().await, Some(Coordinates::new(12.87, 74.88)));
}
