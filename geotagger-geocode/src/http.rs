//! Shared HTTP client for geocoding requests.

use crate::config::GeocodeConfig;
use crate::error::GeocodeError;
use std::time::Duration;

/// User-Agent sent when the configuration does not provide one.
pub const DEFAULT_USER_AGENT: &str = concat!("geotagger-geocode/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] configured for geocoding providers.
///
/// The client has the configured timeout, an identifying User-Agent and
/// gzip decompression.
///
/// # Errors
///
/// Returns [`GeocodeError::Http`] if the client cannot be constructed.
pub fn build_client(config: &GeocodeConfig) -> Result<reqwest::Client, GeocodeError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .build()
        .map_err(|e| GeocodeError::Http(format!("failed to build HTTP client: {e}")))
}

/// Read a response body, mapping non-success statuses to [`GeocodeError::Status`].
pub(crate) async fn read_success_body(
    provider: &str,
    response: reqwest::Response,
) -> Result<String, GeocodeError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| GeocodeError::Http(format!("{provider} response read failed: {e}")))?;

    if !status.is_success() {
        return Err(GeocodeError::Status {
            code: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }
    Ok(body)
}
