use serde::Deserialize;

// --- OpenCage ---

#[derive(Debug, Clone, Deserialize)]
pub struct OpenCageResponse {
    pub status: OpenCageStatus,
    #[serde(default)]
    pub results: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenCageStatus {
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

/// One geocoding match. Reverse lookups return up to `limit` of these,
/// ordered by the provider's own confidence, not by distance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub formatted: String,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Geometry {
    pub lat: f64,
    pub lng: f64,
}

/// Address parts keyed the way OpenCage keys them. Only the parts the
/// enrichment pipeline reads are kept; the rest are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Components {
    pub attraction: Option<String>,
    pub building: Option<String>,
    pub road: Option<String>,
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub city_district: Option<String>,
    pub municipality: Option<String>,
    pub county: Option<String>,
    pub state_district: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

// --- Reverse-geocoding gateway ---

/// Body returned by the internal gateway. Older deployments send
/// `formatted_address`, newer ones `address`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayLocation {
    #[serde(alias = "formatted_address", alias = "formattedAddress")]
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub ward: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    #[serde(alias = "placeName")]
    pub place_name: Option<String>,
}

// --- IP geolocation ---

/// ipapi.co style body. Rate-limited requests come back as 200 with
/// `error: true` and a `reason`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IpLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub error: bool,
    pub reason: Option<String>,
}
