//! Geocoder configuration with sensible defaults.
//!
//! [`GeocodeConfig`] selects the provider, endpoint, timeouts and caching.
//! It is serde-friendly so host applications can embed it in their own
//! configuration files.

use crate::error::GeocodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Public OpenStreetMap Nominatim instance.
pub const NOMINATIM_DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org";

/// Google Maps Platform base URL.
pub const GOOGLE_DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com";

/// Maximum rounding precision for cache keys (about 1 cm at the equator).
pub const MAX_COORDINATE_PRECISION: u8 = 7;

/// Reverse geocoding backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeProvider {
    /// OpenStreetMap Nominatim (`/reverse`). No API key required.
    #[default]
    Nominatim,
    /// Google Geocoding API (`/maps/api/geocode/json`). Requires an API key.
    Google,
}

impl GeocodeProvider {
    /// Human-readable provider name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nominatim => "Nominatim",
            Self::Google => "Google",
        }
    }

    /// Base URL used when the configuration does not override it.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Nominatim => NOMINATIM_DEFAULT_ENDPOINT,
            Self::Google => GOOGLE_DEFAULT_ENDPOINT,
        }
    }
}

impl fmt::Display for GeocodeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for reverse geocoding lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    /// Which provider to query.
    pub provider: GeocodeProvider,
    /// Base URL override. `None` uses [`GeocodeProvider::default_endpoint`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    /// Provider API key (required by Google, ignored by Nominatim).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// How long to cache resolved addresses in seconds. 0 disables caching.
    pub cache_ttl_seconds: u64,
    /// Decimal places kept when building cache keys.
    pub coordinate_precision: u8,
    /// Preferred response language (BCP 47), e.g. `"en"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Custom User-Agent. Nominatim's usage policy requires an identifying one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            provider: GeocodeProvider::default(),
            endpoint_url: None,
            api_key: None,
            timeout_seconds: 10,
            cache_ttl_seconds: 900,
            coordinate_precision: 4,
            language: None,
            user_agent: None,
        }
    }
}

impl GeocodeConfig {
    /// Config for a specific provider with all other fields defaulted.
    pub fn for_provider(provider: GeocodeProvider) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    /// Set the endpoint URL override.
    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Set the provider API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Effective base URL without a trailing slash.
    pub fn endpoint(&self) -> &str {
        self.endpoint_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
            .trim_end_matches('/')
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - the effective endpoint parses as an absolute URL
    /// - `timeout_seconds` must be greater than 0
    /// - `coordinate_precision` must not exceed [`MAX_COORDINATE_PRECISION`]
    /// - Google requires a non-empty `api_key`
    pub fn validate(&self) -> Result<(), GeocodeError> {
        url::Url::parse(self.endpoint())
            .map_err(|e| GeocodeError::Config(format!("invalid endpoint_url: {e}")))?;
        if self.timeout_seconds == 0 {
            return Err(GeocodeError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.coordinate_precision > MAX_COORDINATE_PRECISION {
            return Err(GeocodeError::Config(format!(
                "coordinate_precision must be <= {MAX_COORDINATE_PRECISION}"
            )));
        }
        if self.provider == GeocodeProvider::Google
            && self.api_key.as_deref().is_none_or(str::is_empty)
        {
            return Err(GeocodeError::Config(
                "the Google provider requires api_key".into(),
            ));
        }
        Ok(())
    }
}
