//! Error types for the geotagger-geocode crate.
//!
//! Messages never include provider API keys. Coordinates may appear in
//! `NoResults` so operators can reproduce an empty lookup.

/// Errors that can occur during a reverse geocoding lookup.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// The HTTP request to the provider failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Truncated response body or provider status text.
        message: String,
    },

    /// The provider response could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider had no address for the given coordinates.
    #[error("no address found for {0}")]
    NoResults(String),

    /// The coordinates are outside the valid WGS84 ranges or not finite.
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// The provider answered but refused the request (quota, key, policy).
    #[error("provider rejected request: {0}")]
    Rejected(String),

    /// The request did not complete within the configured timeout.
    #[error("geocode timed out: {0}")]
    Timeout(String),

    /// Invalid geocoder configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl GeocodeError {
    /// Classify a reqwest transport error.
    pub(crate) fn from_transport(provider: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(format!("{provider} request exceeded timeout"))
        } else {
            Self::Http(format!("{provider} request failed: {err}"))
        }
    }
}

/// Convenience type alias for geocoding results.
pub type Result<T> = std::result::Result<T, GeocodeError>;
