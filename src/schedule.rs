//! Session requests and the repeat schedule derived from them.
//!
//! A [`TrackingRequest`] carries the caller's credentials and the raw
//! polling interval (hours) and session timeout (days). [`ScheduleSpec`] is
//! the normalized form the scheduler runs: non-positive or non-finite inputs
//! are replaced by the configured fallbacks, then
//! `repeat_count = floor(duration_ms / interval_ms)`, never less than 1.

use std::fmt;
use std::time::Duration;

use crate::config::ScheduleConfig;

/// Fallback polling interval when none (or a non-positive one) is supplied.
pub const DEFAULT_INTERVAL_HOURS: f64 = 0.5;

/// Fallback session length when none (or a non-positive one) is supplied.
pub const DEFAULT_DURATION_DAYS: f64 = 1.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_DAY: f64 = 24.0 * MILLIS_PER_HOUR;

/// One tracking session request. Immutable once built.
#[derive(Clone, PartialEq)]
pub struct TrackingRequest {
    /// Organization API key, sent as `x-api-key`.
    pub api_key: String,
    /// Customer session token, sent as `x-auth-token`.
    pub token: String,
    /// Customer identity reported with every geotag.
    pub customer_id: String,
    /// Polling interval in hours.
    pub interval_hours: f64,
    /// Session length in days.
    pub duration_days: f64,
}

impl TrackingRequest {
    /// Build a request with the default schedule (0.5 h every tick for 1 day).
    pub fn new(
        api_key: impl Into<String>,
        token: impl Into<String>,
        customer_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            token: token.into(),
            customer_id: customer_id.into(),
            interval_hours: DEFAULT_INTERVAL_HOURS,
            duration_days: DEFAULT_DURATION_DAYS,
        }
    }

    /// Set the polling interval and session length.
    pub fn with_schedule(mut self, interval_hours: f64, duration_days: f64) -> Self {
        self.interval_hours = interval_hours;
        self.duration_days = duration_days;
        self
    }
}

// Credentials stay out of logs.
impl fmt::Debug for TrackingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingRequest")
            .field("api_key", &"<redacted>")
            .field("token", &"<redacted>")
            .field("customer_id", &self.customer_id)
            .field("interval_hours", &self.interval_hours)
            .field("duration_days", &self.duration_days)
            .finish()
    }
}

/// Normalized schedule for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSpec {
    interval: Duration,
    duration: Duration,
    repeat_count: u64,
}

impl ScheduleSpec {
    /// Normalize `interval_hours` / `duration_days` with the default fallbacks.
    pub fn new(interval_hours: f64, duration_days: f64) -> Self {
        Self::with_fallbacks(interval_hours, duration_days, &ScheduleConfig::default())
    }

    /// Normalize a request's schedule using the configured fallbacks.
    pub fn from_request(request: &TrackingRequest, fallbacks: &ScheduleConfig) -> Self {
        Self::with_fallbacks(request.interval_hours, request.duration_days, fallbacks)
    }

    /// Normalize with explicit fallbacks.
    pub fn with_fallbacks(
        interval_hours: f64,
        duration_days: f64,
        fallbacks: &ScheduleConfig,
    ) -> Self {
        let interval_hours = fallbacks.interval_hours(interval_hours);
        let duration_days = fallbacks.duration_days(duration_days);

        // `as` saturates, so absurdly large inputs clamp rather than wrap.
        let interval_ms = (interval_hours * MILLIS_PER_HOUR).round() as u64;
        let duration_ms = (duration_days * MILLIS_PER_DAY).round() as u64;

        let repeat_count = if interval_ms == 0 {
            1
        } else {
            (duration_ms / interval_ms).max(1)
        };

        Self {
            interval: Duration::from_millis(interval_ms),
            duration: Duration::from_millis(duration_ms),
            repeat_count,
        }
    }

    /// Wait between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total session length.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Number of ticks the session runs. Always at least 1.
    pub fn repeat_count(&self) -> u64 {
        self.repeat_count
    }

    pub fn interval_millis(&self) -> u64 {
        self.interval.as_millis() as u64
    }

    pub fn duration_millis(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

impl fmt::Display for ScheduleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks every {:.3} h over {:.3} d",
            self.repeat_count,
            self.interval.as_secs_f64() / 3_600.0,
            self.duration.as_secs_f64() / 86_400.0
        )
    }
}
