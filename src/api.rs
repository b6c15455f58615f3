//! Address-verification API plumbing shared by the config and report clients.

use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::{GeotagError, Result};

/// Organization schedule configuration.
pub const CONFIG_PATH: &str = "/v1/api/organization/address-verification-config";

/// Geotag report submission.
pub const ADD_GEOTAG_PATH: &str = "/v1/api/customer/add-geotag";

/// Organization API key header.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Customer session token header.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

const USER_AGENT: &str = concat!("geotagger/", env!("CARGO_PKG_VERSION"));

/// Longest response body excerpt kept in error messages.
const MAX_BODY_EXCERPT: usize = 200;

/// Build the HTTP client used for API calls.
///
/// # Errors
///
/// Returns [`GeotagError::Config`] if the client cannot be built.
pub fn build_client(api: &ApiConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(api.request_timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| GeotagError::Config(format!("failed to build HTTP client: {e}")))
}

/// First [`MAX_BODY_EXCERPT`] characters of a response body.
pub(crate) fn body_excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_BODY_EXCERPT {
        trimmed.to_owned()
    } else {
        let mut excerpt: String = trimmed.chars().take(MAX_BODY_EXCERPT).collect();
        excerpt.push('…');
        excerpt
    }
}

/// Describe a transport failure for logs and error messages.
pub(crate) fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_owned()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        format!("transport error: {err}")
    }
}
