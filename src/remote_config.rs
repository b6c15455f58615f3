//! Remote schedule configuration.
//!
//! The organization's polling interval and session timeout come from
//! `GET {base}/v1/api/organization/address-verification-config`:
//!
//! ```json
//! { "data": { "geotaggingPollingInterval": 1.0, "geotaggingSessionTimeout": 2 } }
//! ```
//!
//! Interval is in hours and timeout in days. A non-200 status, a body that
//! is not JSON or a missing `data` object is a fetch failure. Individual
//! fields that are absent, null, non-numeric or non-positive fall back to the
//! configured defaults.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{
    API_KEY_HEADER, CONFIG_PATH, body_excerpt, build_client, describe_transport_error,
};
use crate::config::{ApiConfig, ScheduleConfig};
use crate::error::{GeotagError, Result};
use crate::schedule::{ScheduleSpec, TrackingRequest};

const INTERVAL_FIELD: &str = "geotaggingPollingInterval";
const TIMEOUT_FIELD: &str = "geotaggingSessionTimeout";

/// Normalized schedule values from the remote config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RemoteSchedule {
    pub interval_hours: f64,
    pub duration_days: f64,
}

impl RemoteSchedule {
    /// Attach these values to a request.
    pub fn apply(&self, request: TrackingRequest) -> TrackingRequest {
        request.with_schedule(self.interval_hours, self.duration_days)
    }

    pub fn spec(&self) -> ScheduleSpec {
        ScheduleSpec::new(self.interval_hours, self.duration_days)
    }
}

/// Where session schedules come from.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Fetch the schedule for the organization owning `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`GeotagError::ConfigFetch`] if no usable config was returned.
    async fn fetch_schedule(&self, api_key: &str) -> Result<RemoteSchedule>;
}

/// HTTP client for the remote config endpoint.
pub struct HttpConfigSource {
    client: reqwest::Client,
    url: String,
    fallbacks: ScheduleConfig,
}

impl HttpConfigSource {
    /// Create a client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api: &ApiConfig, fallbacks: ScheduleConfig) -> Result<Self> {
        Ok(Self::with_client(build_client(api)?, api, fallbacks))
    }

    /// Create a client sharing an existing `reqwest::Client`.
    pub fn with_client(
        client: reqwest::Client,
        api: &ApiConfig,
        fallbacks: ScheduleConfig,
    ) -> Self {
        Self {
            client,
            url: api.endpoint(CONFIG_PATH),
            fallbacks,
        }
    }
}

#[async_trait]
impl ConfigSource for HttpConfigSource {
    async fn fetch_schedule(&self, api_key: &str) -> Result<RemoteSchedule> {
        debug!(url = %self.url, "fetching remote schedule");
        let response = self
            .client
            .get(&self.url)
            .header("accept", "*/*")
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| GeotagError::ConfigFetch(describe_transport_error(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GeotagError::ConfigFetch(describe_transport_error(&e)))?;

        if status != reqwest::StatusCode::OK {
            return Err(GeotagError::ConfigFetch(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body_excerpt(&body)
            )));
        }

        let schedule = parse_config_response(&body, &self.fallbacks)?;
        info!(
            interval_hours = schedule.interval_hours,
            duration_days = schedule.duration_days,
            "remote schedule fetched"
        );
        Ok(schedule)
    }
}

/// Decode a config response body, applying `fallbacks` field by field.
///
/// # Errors
///
/// Returns [`GeotagError::ConfigFetch`] if the body is not JSON or has no
/// `data` object.
pub fn parse_config_response(body: &str, fallbacks: &ScheduleConfig) -> Result<RemoteSchedule> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| GeotagError::ConfigFetch(format!("response is not JSON: {e}")))?;
    let data = json
        .get("data")
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| GeotagError::ConfigFetch("response has no `data` object".into()))?;

    let interval = numeric_field(data, INTERVAL_FIELD);
    let duration = numeric_field(data, TIMEOUT_FIELD);
    if interval.is_none() || duration.is_none() {
        warn!(
            interval = ?interval,
            duration = ?duration,
            "remote schedule incomplete, using fallbacks"
        );
    }

    Ok(RemoteSchedule {
        interval_hours: fallbacks.interval_hours(interval.unwrap_or(0.0)),
        duration_days: fallbacks.duration_days(duration.unwrap_or(0.0)),
    })
}

/// A JSON number, or a string holding one.
fn numeric_field(data: &serde_json::Map<String, serde_json::Value>, name: &str) -> Option<f64> {
    match data.get(name)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
