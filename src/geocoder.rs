//! Address resolution for ticks.
//!
//! [`AddressResolver`] is the scheduler's view of reverse geocoding: it never
//! fails. [`GeocoderAdapter`] wraps a `geotagger-geocode` provider and turns
//! every error into an empty [`ParsedAddress`].

use std::sync::Arc;

use async_trait::async_trait;
use geotagger_geocode::{Coordinates, ParsedAddress, ReverseGeocoder, geocoder_from_config};
use tracing::{debug, warn};

use crate::config::GeocoderConfig;
use crate::error::Result;

/// Resolves coordinates to an address, falling back to an empty one.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Resolve `latitude`/`longitude`. Failures yield [`ParsedAddress::default`].
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> ParsedAddress;
}

/// Infallible wrapper over a [`ReverseGeocoder`].
pub struct GeocoderAdapter<G> {
    geocoder: G,
}

impl<G: ReverseGeocoder> GeocoderAdapter<G> {
    pub fn new(geocoder: G) -> Self {
        Self { geocoder }
    }

    pub fn inner(&self) -> &G {
        &self.geocoder
    }
}

#[async_trait]
impl<G: ReverseGeocoder> AddressResolver for GeocoderAdapter<G> {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> ParsedAddress {
        let coordinates = Coordinates::new(latitude, longitude);
        match self.geocoder.reverse(coordinates).await {
            Ok(address) => {
                debug!(provider = %self.geocoder.provider(), "address resolved");
                address
            }
            Err(e) => {
                warn!(
                    provider = %self.geocoder.provider(),
                    error = %e,
                    "reverse geocode failed, reporting empty address"
                );
                ParsedAddress::default()
            }
        }
    }
}

/// Resolver used when geocoding is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

#[async_trait]
impl AddressResolver for NoopResolver {
    async fn reverse_geocode(&self, _latitude: f64, _longitude: f64) -> ParsedAddress {
        ParsedAddress::default()
    }
}

/// Build the resolver selected by the `[geocoder]` config section.
///
/// # Errors
///
/// Returns an error if the provider config is invalid or its HTTP client
/// cannot be built.
pub fn resolver_from_config(config: &GeocoderConfig) -> Result<Arc<dyn AddressResolver>> {
    if !config.enabled {
        debug!("reverse geocoding disabled");
        return Ok(Arc::new(NoopResolver));
    }
    let geocoder = geocoder_from_config(&config.provider)?;
    Ok(Arc::new(GeocoderAdapter::new(geocoder)))
}
