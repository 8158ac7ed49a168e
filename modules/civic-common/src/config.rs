use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CivicError;
use crate::types::Coordinates;

pub const DEFAULT_OPENCAGE_BASE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";
pub const DEFAULT_IP_GEOLOCATION_URL: &str = "https://ipapi.co/json/";
pub const DEFAULT_ML_SERVICE_URL: &str = "http://localhost:8000";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
/// National bounding box (south, west, north, east) for India.
pub const DEFAULT_GEOCODING_BOUNDS: &str = "6.7471,68.0322,35.5133,97.3954";
pub const DEFAULT_GEOCODING_COUNTRY_CODE: &str = "in";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DETECTION_TIMEOUT_SECS: u64 = 5;

/// A locality whose geocoding candidates should be preferred by name over
/// raw distance when a query falls inside its coordinate box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalityRule {
    pub name: String,
    /// Other spellings that count as a match (e.g. colonial-era names).
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Inclusive (min, max) latitude.
    pub lat_range: (f64, f64),
    /// Inclusive (min, max) longitude.
    pub lon_range: (f64, f64),
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl LocalityRule {
    pub fn covers(&self, coords: &Coordinates) -> bool {
        let (lat_min, lat_max) = self.lat_range;
        let (lon_min, lon_max) = self.lon_range;
        (lat_min..=lat_max).contains(&coords.latitude)
            && (lon_min..=lon_max).contains(&coords.longitude)
    }

    /// Case-insensitive substring match against the rule name or any alias.
    pub fn mentions(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .any(|needle| !needle.is_empty() && haystack.contains(&needle.to_lowercase()))
    }

    pub fn mangaluru() -> Self {
        Self {
            name: "Mangaluru".to_string(),
            aliases: vec!["Mangalore".to_string()],
            lat_range: (12.8, 13.0),
            lon_range: (74.8, 75.0),
            district: Some("Dakshina Kannada".to_string()),
            state: Some("Karnataka".to_string()),
            country: Some("India".to_string()),
        }
    }
}

/// Process-wide provider configuration. Loaded once at startup and shared
/// read-only by every enrichment.
#[derive(Debug, Clone)]
pub struct Config {
    // Geocoding
    pub gateway_url: Option<String>,
    pub geocoding_api_key: Option<String>,
    pub opencage_base_url: String,
    pub geocoding_country_code: String,
    pub geocoding_bounds: String,
    pub ip_geolocation_url: Option<String>,
    pub locality_rules: Vec<LocalityRule>,

    // Image classification
    pub ml_service_url: String,

    // Narrative generation
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,

    // Timeouts
    pub provider_timeout: Duration,
    pub detection_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_url: None,
            geocoding_api_key: None,
            opencage_base_url: DEFAULT_OPENCAGE_BASE_URL.to_string(),
            geocoding_country_code: DEFAULT_GEOCODING_COUNTRY_CODE.to_string(),
            geocoding_bounds: DEFAULT_GEOCODING_BOUNDS.to_string(),
            ip_geolocation_url: Some(DEFAULT_IP_GEOLOCATION_URL.to_string()),
            locality_rules: vec![LocalityRule::mangaluru()],
            ml_service_url: DEFAULT_ML_SERVICE_URL.to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            detection_timeout: Duration::from_secs(DEFAULT_DETECTION_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    /// Missing keys are fine: the matching provider is simply left out.
    pub fn from_env() -> Result<Self, CivicError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CivicError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let locality_rules = match var("LOCALITY_RULES") {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| CivicError::Config(format!("LOCALITY_RULES is not valid JSON: {e}")))?,
            None => defaults.locality_rules,
        };

        // An explicitly empty IP_GEOLOCATION_URL disables the lookup.
        let ip_geolocation_url = match lookup("IP_GEOLOCATION_URL") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().to_string()),
            None => defaults.ip_geolocation_url,
        };

        Ok(Self {
            gateway_url: var("GEOCODING_GATEWAY_URL"),
            geocoding_api_key: var("GEOCODING_API_KEY"),
            opencage_base_url: var("OPENCAGE_BASE_URL").unwrap_or(defaults.opencage_base_url),
            geocoding_country_code: var("GEOCODING_COUNTRY_CODE")
                .unwrap_or(defaults.geocoding_country_code),
            geocoding_bounds: var("GEOCODING_BOUNDS").unwrap_or(defaults.geocoding_bounds),
            ip_geolocation_url,
            locality_rules,
            ml_service_url: var("ML_SERVICE_URL").unwrap_or(defaults.ml_service_url),
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            provider_timeout: seconds(var("PROVIDER_TIMEOUT_SECS"), "PROVIDER_TIMEOUT_SECS")?
                .unwrap_or(defaults.provider_timeout),
            detection_timeout: seconds(var("DETECTION_TIMEOUT_SECS"), "DETECTION_TIMEOUT_SECS")?
                .unwrap_or(defaults.detection_timeout),
        })
    }

    /// Log which providers are configured without leaking secrets.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.char_indices().nth(4).map(|(i, _)| i).unwrap_or(val.len());
            format!("{}...({} chars)", &val[..n], val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) => preview(v),
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!(
            "  GEOCODING_GATEWAY_URL: {}",
            self.gateway_url.as_deref().unwrap_or("<not set>")
        );
        tracing::info!("  GEOCODING_API_KEY: {}", preview_opt(&self.geocoding_api_key));
        tracing::info!(
            "  IP_GEOLOCATION_URL: {}",
            self.ip_geolocation_url.as_deref().unwrap_or("<disabled>")
        );
        tracing::info!("  ML_SERVICE_URL: {}", self.ml_service_url);
        tracing::info!("  GEMINI_API_KEY: {}", preview_opt(&self.gemini_api_key));
        tracing::info!("  GEMINI_MODEL: {}", self.gemini_model);
        tracing::info!(
            "  timeouts: provider={}s detection={}s",
            self.provider_timeout.as_secs(),
            self.detection_timeout.as_secs()
        );
        tracing::info!("  locality rules: {}", self.locality_rules.len());
    }
}

fn seconds(raw: Option<String>, key: &str) -> Result<Option<Duration>, CivicError> {
    raw.map(|v| {
        v.parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| CivicError::Config(format!("{key} must be a whole number of seconds, got {v:?}")))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert!(config.gateway_url.is_none());
        assert!(config.geocoding_api_key.is_none());
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.ml_service_url, DEFAULT_ML_SERVICE_URL);
        assert_eq!(config.provider_timeout, Duration::from_secs(10));
        assert_eq!(config.detection_timeout, Duration::from_secs(5));
        assert_eq!(config.locality_rules, vec![LocalityRule::mangaluru()]);
        assert_eq!(config.ip_geolocation_url.as_deref(), Some(DEFAULT_IP_GEOLOCATION_URL));
    }

    #[test]
    fn blank_keys_count_as_unset() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "   ")])).unwrap();
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn empty_ip_url_disables_lookup() {
        let config = Config::from_lookup(lookup(&[("IP_GEOLOCATION_URL", "")])).unwrap();
        assert!(config.ip_geolocation_url.is_none());
    }

    #[test]
    fn bad_timeout_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("PROVIDER_TIMEOUT_SECS", "ten")])).unwrap_err();
        assert!(err.to_string().contains("PROVIDER_TIMEOUT_SECS"));
    }

    #[test]
    fn locality_rules_parse_from_json() {
        let json = r#"[{"name":"Udupi","latRange":[13.3,13.4],"lonRange":[74.7,74.8]}]"#;
        let config = Config::from_lookup(lookup(&[("LOCALITY_RULES", json)])).unwrap();
        assert_eq!(config.locality_rules.len(), 1);
        let rule = &config.locality_rules[0];
        assert_eq!(rule.name, "Udupi");
        assert!(rule.aliases.is_empty());
        assert!(rule.district.is_none());
    }

    #[test]
    fn malformed_rules_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("LOCALITY_RULES", "[{")])).is_err());
    }

    #[test]
    fn rule_range_is_inclusive() {
        let rule = LocalityRule::mangaluru();
        assert!(rule.covers(&Coordinates::new(12.8, 75.0)));
        assert!(rule.covers(&Coordinates::new(12.91, 74.85)));
        assert!(!rule.covers(&Coordinates::new(12.79, 74.85)));
        assert!(!rule.covers(&Coordinates::new(12.91, 75.01)));
    }

    #[test]
    fn rule_mentions_name_or_alias_case_insensitively() {
        let rule = LocalityRule::mangaluru();
        assert!(rule.mentions("Hampankatta, MANGALURU - 575001"));
        assert!(rule.mentions("mangalore"));
        assert!(!rule.mentions("Udupi, Karnataka"));
    }
}
