pub mod error;
pub mod types;

pub use error::{GeocodingError, Result};
pub use types::{
    Candidate, Components, GatewayLocation, Geometry, IpLocation, OpenCageResponse, OpenCageStatus,
};

const OPENCAGE_BASE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";
const IPAPI_URL: &str = "https://ipapi.co/json/";
const USER_AGENT: &str = "civic-enrichment/1.0";

/// Upper bound on candidates per reverse lookup.
pub const REVERSE_CANDIDATE_LIMIT: u32 = 15;

/// Reject bodies that are not a success status, keeping the body as the message.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GeocodingError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(resp)
}

// --- OpenCage ---

pub struct OpenCageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
    country_code: Option<String>,
    bounds: Option<String>,
}

impl OpenCageClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: OPENCAGE_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            language: "en".to_string(),
            country_code: None,
            bounds: None,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Restrict reverse lookups to one country and a `south,west,north,east` box.
    pub fn with_region(mut self, country_code: &str, bounds: &str) -> Self {
        self.country_code = Some(country_code.to_string());
        self.bounds = Some(bounds.to_string());
        self
    }

    async fn query(&self, q: &str, limit: u32, regional: bool) -> Result<Vec<Candidate>> {
        let limit = limit.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("q", q),
            ("key", self.api_key.as_str()),
            ("no_annotations", "1"),
            ("limit", limit.as_str()),
            ("language", self.language.as_str()),
        ];
        if regional {
            if let Some(ref code) = self.country_code {
                params.push(("countrycode", code.as_str()));
            }
            if let Some(ref bounds) = self.bounds {
                params.push(("bounds", bounds.as_str()));
            }
        }

        let resp = self.client.get(&self.base_url).query(&params).send().await?;
        let resp = check_status(resp).await?;
        let body = resp.text().await?;
        let parsed: OpenCageResponse = serde_json::from_str(&body)?;

        if parsed.status.code != 200 {
            return Err(GeocodingError::Api {
                status: parsed.status.code,
                message: parsed.status.message,
            });
        }
        if parsed.results.is_empty() {
            return Err(GeocodingError::NoResults(q.to_string()));
        }

        tracing::debug!(q, count = parsed.results.len(), "OpenCage returned candidates");
        Ok(parsed.results)
    }

    /// Reverse lookup returning every candidate (up to 15) for local disambiguation.
    pub async fn reverse(&self, lat: f64, lng: f64) -> Result<Vec<Candidate>> {
        let q = format!("{lat},{lng}");
        self.query(&q, REVERSE_CANDIDATE_LIMIT, true).await
    }

    /// Forward lookup of a free-text address. Returns the best match.
    pub async fn forward(&self, address: &str) -> Result<Candidate> {
        let mut results = self.query(address, 1, false).await?;
        Ok(results.swap_remove(0))
    }
}

// --- Reverse-geocoding gateway ---

pub struct GatewayClient {
    client: reqwest::Client,
    url: String,
}

impl GatewayClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<GatewayLocation> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[("lat", lat.to_string()), ("lng", lng.to_string())])
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

// --- IP geolocation ---

pub struct IpLocator {
    client: reqwest::Client,
    url: String,
}

impl IpLocator {
    pub fn new() -> Self {
        Self::with_url(IPAPI_URL)
    }

    pub fn with_url(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Best-guess (latitude, longitude) for the caller's network origin.
    pub async fn locate(&self) -> Result<(f64, f64)> {
        let resp = self
            .client
            .get(&self.url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let body = resp.text().await?;
        let located: IpLocation = serde_json::from_str(&body)?;

        if located.error {
            return Err(GeocodingError::Api {
                status: 200,
                message: located.reason.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        match (located.latitude, located.longitude) {
            (Some(lat), Some(lng)) => Ok((lat, lng)),
            _ => Err(GeocodingError::NoResults("ip position".to_string())),
        }
    }
}

impl Default for IpLocator {
    fn default() -> Self {
        Self::new()
    }
}
