use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeocodingError>;

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No results for {0}")]
    NoResults(String),
}

impl From<reqwest::Error> for GeocodingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeocodingError::Timeout(err.to_string())
        } else if err.is_decode() {
            GeocodingError::Parse(err.to_string())
        } else {
            GeocodingError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GeocodingError {
    fn from(err: serde_json::Error) -> Self {
        GeocodingError::Parse(err.to_string())
    }
}
