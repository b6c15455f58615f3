//! In-memory TTL cache in front of a reverse geocoder.
//!
//! A device that stays put between ticks reports the same spot over and
//! over; [`CachedGeocoder`] answers those repeats locally. Keys are the
//! coordinates rounded to `coordinate_precision` decimal places. Only
//! successful lookups are cached so transient failures are retried on the
//! next call.

use std::time::Duration;

use moka::future::Cache;

use crate::config::{GeocodeConfig, GeocodeProvider};
use crate::error::GeocodeError;
use crate::provider::ReverseGeocoder;
use crate::types::{Coordinates, ParsedAddress};

/// Maximum number of cached addresses.
const MAX_CACHE_ENTRIES: u64 = 1_000;

/// Cache key: coordinates scaled by `10^precision` and rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat: i64,
    lng: i64,
}

impl CacheKey {
    /// Build a key for `coordinates` at the given decimal precision.
    pub fn new(coordinates: &Coordinates, precision: u8) -> Self {
        let scale = 10_f64.powi(i32::from(precision));
        Self {
            lat: (coordinates.latitude * scale).round() as i64,
            lng: (coordinates.longitude * scale).round() as i64,
        }
    }
}

/// A reverse geocoder with an optional address cache.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: Option<Cache<CacheKey, ParsedAddress>>,
    precision: u8,
}

impl<G: ReverseGeocoder> CachedGeocoder<G> {
    /// Wrap `inner` using the TTL and precision from `config`.
    ///
    /// A `cache_ttl_seconds` of 0 disables caching entirely.
    pub fn new(inner: G, config: &GeocodeConfig) -> Self {
        let cache = (config.cache_ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
                .build()
        });
        Self {
            inner,
            cache,
            precision: config.coordinate_precision,
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Number of cached entries (approximate; pending maintenance is not run).
    pub fn cached_entries(&self) -> u64 {
        self.cache.as_ref().map_or(0, Cache::entry_count)
    }
}

impl<G: ReverseGeocoder> ReverseGeocoder for CachedGeocoder<G> {
    async fn reverse(&self, coordinates: Coordinates) -> Result<ParsedAddress, GeocodeError> {
        let Some(cache) = &self.cache else {
            return self.inner.reverse(coordinates).await;
        };

        let key = CacheKey::new(&coordinates, self.precision);
        if let Some(hit) = cache.get(&key).await {
            tracing::trace!(%coordinates, "geocode cache hit");
            return Ok(hit);
        }

        let address = self.inner.reverse(coordinates).await?;
        cache.insert(key, address.clone()).await;
        Ok(address)
    }

    fn provider(&self) -> GeocodeProvider {
        self.inner.provider()
    }
}
