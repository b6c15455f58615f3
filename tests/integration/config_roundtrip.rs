//! Config file loading, saving and validation through the public API.

use geotagger::ScheduleSpec;
use geotagger::config::GeotagConfig;
use geotagger_geocode::GeocodeProvider;

#[test]
fn hand_written_file_loads_with_defaults_for_missing_sections() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[api]
base_url = "http://localhost:8080"

[schedule]
fallback_interval_hours = 2.0

[geocoder]
provider = "google"
api_key = "g-key"
language = "en"

[logging]
filter = "geotagger=debug"
"#,
    )
    .unwrap();

    let config = GeotagConfig::from_file(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(config.api.base_url, "http://localhost:8080");
    assert_eq!(config.api.request_timeout_secs, 15);
    assert_eq!(config.schedule.fallback_duration_days, 1.0);
    assert!(config.geocoder.enabled);
    assert_eq!(config.geocoder.provider.provider, GeocodeProvider::Google);
    assert_eq!(config.geocoder.provider.api_key.as_deref(), Some("g-key"));
    assert!(config.notification.toast_on_success);
    assert_eq!(config.logging.filter, "geotagger=debug");

    let spec = ScheduleSpec::with_fallbacks(0.0, -3.0, &config.schedule);
    assert_eq!(spec.repeat_count(), 12);
}

#[test]
fn saved_file_reloads_identically() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("config.toml");

    let mut config = GeotagConfig::default();
    config.notification.title = "Verifying your address".into();
    config.geocoder.enabled = false;
    config.logging.directory = Some(tmp.path().join("logs"));
    config.save_to_file(&path).unwrap();

    let loaded = GeotagConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("absent.toml");
    let config = GeotagConfig::load_or_default(&path).unwrap();
    assert_eq!(config, GeotagConfig::default());
}

#[test]
fn google_without_key_fails_validation() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[geocoder]\nprovider = \"google\"\n").unwrap();

    let config = GeotagConfig::from_file(&path).unwrap();
    let err = config.validate().unwrap_err();
    assert!(
        err.to_string().contains("api_key"),
        "unexpected error: {err}"
    );
}

#[test]
fn disabled_geocoder_skips_provider_validation() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[geocoder]\nenabled = false\nprovider = \"google\"\n").unwrap();

    let config = GeotagConfig::from_file(&path).unwrap();
    assert!(config.validate().is_ok());
}
