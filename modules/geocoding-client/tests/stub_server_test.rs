//! Client tests against in-process stub servers.
//!
//! Each test binds an axum router to an ephemeral port, points a client at it,
//! and asserts both on what the client sent and on how it read the reply.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use geocoding_client::{GatewayClient, GeocodingError, IpLocator, OpenCageClient};
use serde_json::{json, Value};

type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn capturing(body: Value, status: StatusCode) -> (Router, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/geocode",
            get(
                move |State(seen): State<Captured>, Query(params): Query<HashMap<String, String>>| {
                    let body = body.clone();
                    async move {
                        seen.lock().unwrap().push(params);
                        (status, Json(body)).into_response()
                    }
                },
            ),
        )
        .with_state(captured.clone());
    (app, captured)
}

fn mangaluru_body() -> Value {
    json!({
        "status": {"code": 200, "message": "OK"},
        "results": [
            {
                "formatted": "Hampankatta, Mangaluru 575001, India",
                "geometry": {"lat": 12.8698, "lng": 74.8430},
                "components": {"neighbourhood": "Hampankatta", "city": "Mangaluru"}
            },
            {
                "formatted": "Dakshina Kannada, India",
                "geometry": {"lat": 12.9, "lng": 74.9},
                "components": {"county": "Dakshina Kannada"}
            }
        ]
    })
}

#[tokio::test]
async fn reverse_sends_regional_query_with_fifteen_candidates() {
    let (app, captured) = capturing(mangaluru_body(), StatusCode::OK);
    let base = spawn(app).await;

    let client = OpenCageClient::new("test-key")
        .with_base_url(&format!("{base}/geocode"))
        .with_region("in", "6.7471,68.0322,35.5133,97.3954");
    let candidates = client.reverse(12.9141, 74.856).await.unwrap();

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].components.city.as_deref(), Some("Mangaluru"));

    let seen = captured.lock().unwrap();
    let params = &seen[0];
    assert_eq!(params["q"], "12.9141,74.856");
    assert_eq!(params["key"], "test-key");
    assert_eq!(params["limit"], "15");
    assert_eq!(params["language"], "en");
    assert_eq!(params["countrycode"], "in");
    assert_eq!(params["bounds"], "6.7471,68.0322,35.5133,97.3954");
}

#[tokio::test]
async fn forward_is_not_region_bound_and_takes_first_match() {
    let (app, captured) = capturing(mangaluru_body(), StatusCode::OK);
    let base = spawn(app).await;

    let client = OpenCageClient::new("k")
        .with_base_url(&format!("{base}/geocode"))
        .with_region("in", "6.7471,68.0322,35.5133,97.3954");
    let best = client.forward("Hampankatta, Mangaluru").await.unwrap();

    assert_eq!(best.formatted, "Hampankatta, Mangaluru 575001, India");
    let seen = captured.lock().unwrap();
    assert_eq!(seen[0]["limit"], "1");
    assert!(!seen[0].contains_key("bounds"));
}

#[tokio::test]
async fn empty_results_are_no_results() {
    let body = json!({"status": {"code": 200, "message": "OK"}, "results": []});
    let (app, _) = capturing(body, StatusCode::OK);
    let base = spawn(app).await;

    let client = OpenCageClient::new("k").with_base_url(&format!("{base}/geocode"));
    let err = client.reverse(0.0, 0.0).await.unwrap_err();
    assert!(matches!(err, GeocodingError::NoResults(_)));
}

#[tokio::test]
async fn http_error_status_is_api_error() {
    let body = json!({"status": {"code": 401, "message": "invalid API key"}, "results": []});
    let (app, _) = capturing(body, StatusCode::UNAUTHORIZED);
    let base = spawn(app).await;

    let client = OpenCageClient::new("bad").with_base_url(&format!("{base}/geocode"));
    let err = client.reverse(1.0, 2.0).await.unwrap_err();
    assert!(matches!(err, GeocodingError::Api { status: 401, .. }));
}

#[tokio::test]
async fn in_body_error_status_is_api_error() {
    let body = json!({"status": {"code": 402, "message": "quota exceeded"}});
    let (app, _) = capturing(body, StatusCode::OK);
    let base = spawn(app).await;

    let client = OpenCageClient::new("k").with_base_url(&format!("{base}/geocode"));
    match client.reverse(1.0, 2.0).await.unwrap_err() {
        GeocodingError::Api { status, message } => {
            assert_eq!(status, 402);
            assert_eq!(message, "quota exceeded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn gateway_passes_lat_lng_and_reads_location() {
    let body = json!({
        "address": "Car Street, Mangaluru",
        "city": "Mangaluru",
        "state": "Karnataka",
        "country": "India",
        "neighborhood": "",
        "ward": "",
        "district": "Dakshina Kannada",
        "place_name": "Car Street"
    });
    let (app, captured) = capturing(body, StatusCode::OK);
    let base = spawn(app).await;

    let gateway = GatewayClient::new(&format!("{base}/geocode"));
    let location = gateway.reverse_geocode(12.87, 74.84).await.unwrap();

    assert_eq!(location.address.as_deref(), Some("Car Street, Mangaluru"));
    assert_eq!(location.place_name.as_deref(), Some("Car Street"));
    let seen = captured.lock().unwrap();
    assert_eq!(seen[0]["lat"], "12.87");
    assert_eq!(seen[0]["lng"], "74.84");
}

#[tokio::test]
async fn gateway_non_json_body_is_parse_error() {
    let app = Router::new().route("/geocode", get(|| async { "<html>oops</html>" }));
    let base = spawn(app).await;

    let gateway = GatewayClient::new(&format!("{base}/geocode"));
    let err = gateway.reverse_geocode(1.0, 2.0).await.unwrap_err();
    assert!(matches!(err, GeocodingError::Parse(_)));
}

#[tokio::test]
async fn ip_locator_reads_coordinates() {
    let app = Router::new().route(
        "/json/",
        get(|| async { Json(json!({"latitude": 12.87, "longitude": 74.88, "city": "Mangalore"})) }),
    );
    let base = spawn(app).await;

    let locator = IpLocator::with_url(&format!("{base}/json/"));
    assert_eq!(locator.locate().await.unwrap(), (12.87, 74.88));
}

#[tokio::test]
async fn ip_locator_rate_limit_is_an_error() {
    let app = Router::new().route(
        "/json/",
        get(|| async { Json(json!({"error": true, "reason": "RateLimited"})) }),
    );
    let base = spawn(app).await;

    let locator = IpLocator::with_url(&format!("{base}/json/"));
    let err = locator.locate().await.unwrap_err();
    assert!(err.to_string().contains("RateLimited"));
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    // Port 9 (discard) on loopback is closed on test machines.
    let gateway = GatewayClient::new("http://127.0.0.1:9/geocode");
    let err = gateway.reverse_geocode(1.0, 2.0).await.unwrap_err();
    assert!(matches!(err, GeocodingError::Network(_)));
}
