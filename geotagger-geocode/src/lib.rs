//! # geotagger-geocode
//!
//! Reverse geocoding for geotagger: turns a coordinate pair into a
//! structured postal address.
//!
//! ## Design
//!
//! - Pluggable providers behind [`ReverseGeocoder`]: OpenStreetMap
//!   Nominatim (default, keyless) and the Google Geocoding API
//! - Provider fields are normalised into one [`ParsedAddress`] shape with
//!   the same fallbacks a device geocoder applies (street, else first line
//!   of the formatted address; house number, else feature name)
//! - Optional in-memory TTL cache keyed by rounded coordinates
//!
//! ## Privacy
//!
//! - Coordinates are logged only at trace level
//! - API keys never appear in error messages

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod provider;
pub mod providers;
pub mod types;

pub use cache::CachedGeocoder;
pub use config::{GeocodeConfig, GeocodeProvider};
pub use error::{GeocodeError, Result};
pub use provider::ReverseGeocoder;
pub use providers::AnyGeocoder;
pub use types::{Coordinates, ParsedAddress};

/// The configured provider with its cache, as built by [`geocoder_from_config`].
pub type Geocoder = CachedGeocoder<AnyGeocoder>;

/// Build the provider selected by `config`, wrapped in its cache.
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] for an invalid configuration, or
/// [`GeocodeError::Http`] if the HTTP client cannot be built.
pub fn geocoder_from_config(config: &GeocodeConfig) -> Result<Geocoder> {
    let provider = AnyGeocoder::from_config(config)?;
    Ok(CachedGeocoder::new(provider, config))
}

/// Resolve a single coordinate pair without caching.
///
/// # Errors
///
/// Same as [`ReverseGeocoder::reverse`], plus configuration errors.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> geotagger_geocode::Result<()> {
/// let config = geotagger_geocode::GeocodeConfig::default();
/// let here = geotagger_geocode::Coordinates::new(6.4281, 3.4219);
/// let address = geotagger_geocode::reverse_geocode(here, &config).await?;
/// println!("{}", address.street_line());
/// # Ok(())
/// # }
/// ```
pub async fn reverse_geocode(
    coordinates: Coordinates,
    config: &GeocodeConfig,
) -> Result<ParsedAddress> {
    AnyGeocoder::from_config(config)?
        .reverse(coordinates)
        .await
}
