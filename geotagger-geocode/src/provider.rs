//! Trait definition for pluggable reverse geocoding backends.
//!
//! Each provider (Nominatim, Google) implements [`ReverseGeocoder`] so the
//! cache layer and callers see a uniform interface.

use crate::config::GeocodeProvider;
use crate::error::GeocodeError;
use crate::types::{Coordinates, ParsedAddress};

/// A pluggable reverse geocoding backend.
///
/// Implementors handle their own URL construction, authentication and
/// response decoding. All implementations must be `Send + Sync` so a single
/// instance can serve concurrent lookups.
pub trait ReverseGeocoder: Send + Sync {
    /// Resolve coordinates to a structured address.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails, the provider rejects
    /// it, the response cannot be decoded, or no address exists.
    fn reverse(
        &self,
        coordinates: Coordinates,
    ) -> impl std::future::Future<Output = Result<ParsedAddress, GeocodeError>> + Send;

    /// Returns which provider this implementation talks to.
    fn provider(&self) -> GeocodeProvider;
}

/// Reject coordinates no provider can answer for.
pub(crate) fn ensure_valid(coordinates: &Coordinates) -> Result<(), GeocodeError> {
    if coordinates.is_valid() {
        Ok(())
    } else {
        Err(GeocodeError::InvalidCoordinates(format!(
            "{}, {}",
            coordinates.latitude, coordinates.longitude
        )))
    }
}
