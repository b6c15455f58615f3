//! Reverse geocoding provider implementations.

pub mod google;
pub mod nominatim;

pub use google::GoogleGeocoder;
pub use nominatim::NominatimGeocoder;

use crate::config::{GeocodeConfig, GeocodeProvider};
use crate::error::GeocodeError;
use crate::provider::ReverseGeocoder;
use crate::types::{Coordinates, ParsedAddress};

/// Provider selected at runtime from a [`GeocodeConfig`].
pub enum AnyGeocoder {
    /// OpenStreetMap Nominatim.
    Nominatim(NominatimGeocoder),
    /// Google Geocoding API.
    Google(GoogleGeocoder),
}

impl AnyGeocoder {
    /// Build the provider named by `config.provider`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the configuration is invalid, or
    /// [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        config.validate()?;
        Ok(match config.provider {
            GeocodeProvider::Nominatim => Self::Nominatim(NominatimGeocoder::new(config)?),
            GeocodeProvider::Google => Self::Google(GoogleGeocoder::new(config)?),
        })
    }
}

impl ReverseGeocoder for AnyGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<ParsedAddress, GeocodeError> {
        match self {
            Self::Nominatim(inner) => inner.reverse(coordinates).await,
            Self::Google(inner) => inner.reverse(coordinates).await,
        }
    }

    fn provider(&self) -> GeocodeProvider {
        match self {
            Self::Nominatim(_) => GeocodeProvider::Nominatim,
            Self::Google(_) => GeocodeProvider::Google,
        }
    }
}

/// First comma-separated segment of a formatted address.
pub(crate) fn first_segment(formatted: Option<&str>) -> Option<String> {
    crate::types::non_empty(formatted.and_then(|f| f.split(',').next()))
}
