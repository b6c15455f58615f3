//! Geotag report delivery.
//!
//! One [`Report`] is built and sent per tick:
//!
//! ```text
//! POST {base}/v1/api/customer/add-geotag
//! x-api-key: <api key>
//! x-auth-token: <token>
//! content-type: application/json
//!
//! {"identity":"<customer>","longitude":3.42,"latitude":6.43,"address":"<line one> <line two>"}
//! ```
//!
//! Any 2xx is delivered. Everything else is a [`GeotagError::ReportDelivery`];
//! the scheduler logs it and moves on without retrying.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use geotagger_geocode::ParsedAddress;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{
    ADD_GEOTAG_PATH, API_KEY_HEADER, AUTH_TOKEN_HEADER, body_excerpt, build_client,
    describe_transport_error,
};
use crate::config::ApiConfig;
use crate::error::{GeotagError, Result};
use crate::location::LocationSample;

/// Wire body of one geotag report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Customer identity.
    pub identity: String,
    pub longitude: f64,
    pub latitude: f64,
    /// `"<address_line_one> <address_line_two>"`.
    pub address: String,
}

impl Report {
    /// Build the report for one tick.
    pub fn new(customer_id: &str, sample: &LocationSample, address: &ParsedAddress) -> Self {
        Self {
            identity: customer_id.to_owned(),
            longitude: sample.longitude,
            latitude: sample.latitude,
            address: address.street_line(),
        }
    }
}

/// Sends reports to the remote API.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// Deliver one report.
    ///
    /// # Errors
    ///
    /// Returns [`GeotagError::ReportDelivery`] on a non-2xx status or a
    /// transport failure.
    async fn send(&self, report: &Report, api_key: &str, token: &str) -> Result<()>;
}

/// Delivery counters, shared across sessions.
#[derive(Debug, Default)]
pub struct ReportStats {
    attempted: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`ReportStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportStatsSnapshot {
    pub attempted: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl ReportStats {
    pub fn snapshot(&self) -> ReportStatsSnapshot {
        ReportStatsSnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: &Result<()>) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
        if outcome.is_ok() {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// reqwest implementation of [`ReportTransport`].
pub struct HttpReporter {
    client: reqwest::Client,
    url: String,
    stats: Arc<ReportStats>,
}

impl HttpReporter {
    /// Create a reporter for the configured API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api: &ApiConfig) -> Result<Self> {
        Ok(Self::with_client(build_client(api)?, api))
    }

    /// Create a reporter sharing an existing client.
    pub fn with_client(client: reqwest::Client, api: &ApiConfig) -> Self {
        Self {
            client,
            url: api.endpoint(ADD_GEOTAG_PATH),
            stats: Arc::new(ReportStats::default()),
        }
    }

    /// Delivery counters for this reporter.
    pub fn stats(&self) -> Arc<ReportStats> {
        Arc::clone(&self.stats)
    }

    async fn post(&self, report: &Report, api_key: &str, token: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, api_key)
            .header(AUTH_TOKEN_HEADER, token)
            .json(report)
            .send()
            .await
            .map_err(|e| GeotagError::ReportDelivery {
                status: None,
                message: describe_transport_error(&e),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(GeotagError::ReportDelivery {
            status: Some(status.as_u16()),
            message: body_excerpt(&body),
        })
    }
}

#[async_trait]
impl ReportTransport for HttpReporter {
    async fn send(&self, report: &Report, api_key: &str, token: &str) -> Result<()> {
        let outcome = self.post(report, api_key, token).await;
        self.stats.record(&outcome);
        match &outcome {
            Ok(()) => debug!("geotag report delivered"),
            Err(GeotagError::ReportDelivery { status, message }) => {
                warn!(status = ?status, %message, "geotag report failed");
            }
            Err(e) => warn!(error = %e, "geotag report failed"),
        }
        outcome
    }
}
