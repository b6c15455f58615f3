//! Error types for the geotagging pipeline.
//!
//! None of these are fatal to a running session: the scheduler logs and
//! swallows them per tick. They surface to callers only from the CLI and
//! from the building blocks used directly (config fetch, report send).

use crate::location::LocationUnavailable;

/// Top-level error type for geotagger.
#[derive(Debug, thiserror::Error)]
pub enum GeotagError {
    /// Remote schedule configuration could not be fetched or decoded.
    #[error("config fetch error: {0}")]
    ConfigFetch(String),

    /// No location sample this tick. The scheduler turns it into a skipped
    /// tick.
    #[error("location unavailable: {0}")]
    LocationUnavailable(#[from] LocationUnavailable),

    /// Reverse geocoding failed.
    #[error("geocode error: {0}")]
    Geocode(String),

    /// The report endpoint rejected the report or could not be reached.
    #[error("report delivery failed{}: {message}", fmt_status(.status))]
    ReportDelivery {
        /// HTTP status, when a response arrived.
        status: Option<u16>,
        /// Response body excerpt or transport error.
        message: String,
    },

    /// Local configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl From<geotagger_geocode::GeocodeError> for GeotagError {
    fn from(e: geotagger_geocode::GeocodeError) -> Self {
        Self::Geocode(e.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, GeotagError>;
