//! Configuration types for geotagger.
//!
//! Loaded from `~/.config/geotagger/config.toml`. Every section is
//! `#[serde(default)]`, so a partial (or empty) file is valid.

use std::path::{Path, PathBuf};

use geotagger_geocode::GeocodeConfig;
use serde::{Deserialize, Serialize};

use crate::background::BackgroundNotice;
use crate::error::{GeotagError, Result};
use crate::schedule::{DEFAULT_DURATION_DAYS, DEFAULT_INTERVAL_HOURS};

/// Production address-verification API.
pub const DEFAULT_BASE_URL: &str = "https://api.rd.usesourceid.com";

/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "geotagger=info,geotagger_geocode=info";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeotagConfig {
    /// Remote API settings.
    pub api: ApiConfig,
    /// Schedule fallbacks.
    pub schedule: ScheduleConfig,
    /// Reverse geocoding.
    pub geocoder: GeocoderConfig,
    /// Background indicator and transient notices.
    pub notification: NotificationConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Remote address-verification API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are appended to it.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            request_timeout_secs: 15,
        }
    }
}

impl ApiConfig {
    /// API settings pointing at `base_url` with the default timeout.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Values substituted for missing or non-positive schedule inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Polling interval used when the supplied one is absent or <= 0.
    pub fallback_interval_hours: f64,
    /// Session length used when the supplied one is absent or <= 0.
    pub fallback_duration_days: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fallback_interval_hours: DEFAULT_INTERVAL_HOURS,
            fallback_duration_days: DEFAULT_DURATION_DAYS,
        }
    }
}

impl ScheduleConfig {
    /// `raw` if it is a positive finite number, else the fallback interval.
    pub fn interval_hours(&self, raw: f64) -> f64 {
        positive_or(raw, self.fallback_interval_hours)
    }

    /// `raw` if it is a positive finite number, else the fallback duration.
    pub fn duration_days(&self, raw: f64) -> f64 {
        positive_or(raw, self.fallback_duration_days)
    }
}

fn positive_or(raw: f64, fallback: f64) -> f64 {
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        fallback
    }
}

/// Reverse geocoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// When false, every tick reports an empty address.
    pub enabled: bool,
    /// Provider selection and tuning.
    #[serde(flatten)]
    pub provider: GeocodeConfig,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: GeocodeConfig::default(),
        }
    }
}

/// Persistent indicator text and transient success notices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub channel_id: String,
    pub channel_name: String,
    pub title: String,
    pub text: String,
    /// Show "Sending Location ..." after each delivered report.
    pub toast_on_success: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        let notice = BackgroundNotice::default();
        Self {
            channel_id: notice.channel_id,
            channel_name: notice.channel_name,
            title: notice.title,
            text: notice.text,
            toast_on_success: true,
        }
    }
}

impl NotificationConfig {
    /// The persistent indicator described by this section.
    pub fn notice(&self) -> BackgroundNotice {
        BackgroundNotice {
            channel_id: self.channel_id.clone(),
            channel_name: self.channel_name.clone(),
            title: self.title.clone(),
            text: self.text.clone(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Directory for a daily-rolling log file. `None` logs to stderr only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_owned(),
            directory: None,
        }
    }
}

impl GeotagConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| GeotagError::Config(e.to_string()))
    }

    /// Load `path` if it exists, else the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| GeotagError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/geotagger/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("geotagger").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("geotagger")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/geotagger-config/config.toml")
        }
    }

    /// Check field ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`GeotagError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url)
            .map_err(|e| GeotagError::Config(format!("api.base_url: {e}")))?;
        if self.api.request_timeout_secs == 0 {
            return Err(GeotagError::Config(
                "api.request_timeout_secs must be greater than 0".into(),
            ));
        }
        for (name, value) in [
            (
                "schedule.fallback_interval_hours",
                self.schedule.fallback_interval_hours,
            ),
            (
                "schedule.fallback_duration_days",
                self.schedule.fallback_duration_days,
            ),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeotagError::Config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.geocoder.enabled {
            self.geocoder
                .provider
                .validate()
                .map_err(|e| GeotagError::Config(format!("geocoder: {e}")))?;
        }
        if self.logging.filter.trim().is_empty() {
            return Err(GeotagError::Config("logging.filter must not be empty".into()));
        }
        Ok(())
    }
}
