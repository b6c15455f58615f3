//! Tracking against mock config and report endpoints over real HTTP.

use std::sync::Arc;
use std::time::Duration;

use geotagger::background::BackgroundHost;
use geotagger::config::{ApiConfig, GeotagConfig};
use geotagger::location::StaticLocationSource;
use geotagger::remote_config::{ConfigSource, HttpConfigSource};
use geotagger::{SessionEnd, TrackingSession};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::RecordingHost;

const CONFIG_PATH: &str = "/v1/api/organization/address-verification-config";
const ADD_GEOTAG_PATH: &str = "/v1/api/customer/add-geotag";

fn config_for(server: &MockServer) -> GeotagConfig {
    let mut config = GeotagConfig {
        api: ApiConfig::with_base_url(server.uri()),
        ..GeotagConfig::default()
    };
    config.geocoder.enabled = false;
    config
}

// 36 ms interval, 108 ms session: three ticks.
fn short_schedule() -> serde_json::Value {
    json!({
        "data": {
            "geotaggingPollingInterval": 0.00001,
            "geotaggingSessionTimeout": 0.00000125
        }
    })
}

#[tokio::test]
async fn session_posts_reports_with_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONFIG_PATH))
        .and(header("x-api-key", "org-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(short_schedule()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ADD_GEOTAG_PATH))
        .and(header("x-api-key", "org-key"))
        .and(header("x-auth-token", "cust-token"))
        .and(body_json(json!({
            "identity": "cust-1",
            "longitude": 3.42,
            "latitude": 6.43,
            "address": " "
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&server)
        .await;

    let host = Arc::new(RecordingHost::default());
    let session = TrackingSession::from_config(
        &config_for(&server),
        Arc::new(StaticLocationSource::new(6.43, 3.42)),
        Arc::clone(&host) as Arc<dyn BackgroundHost>,
        None,
    )
    .unwrap();

    let handle = session
        .start_tracking("org-key", "cust-token", "cust-1", None)
        .await
        .unwrap()
        .expect("session started");
    assert_eq!(handle.schedule().repeat_count(), 3);

    let summary = tokio::time::timeout(Duration::from_secs(10), handle.wait())
        .await
        .expect("session finished");
    assert_eq!(summary.end, SessionEnd::Completed);
    assert_eq!(summary.reports_sent, 3);

    let stats = session
        .report_stats()
        .expect("http reporter stats")
        .snapshot();
    assert_eq!(stats.attempted, 3);
    assert_eq!(stats.delivered, 3);
    assert!(host.held().is_empty());
}

#[tokio::test]
async fn rejected_reports_are_counted_as_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONFIG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(short_schedule()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ADD_GEOTAG_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .expect(3)
        .mount(&server)
        .await;

    let session = TrackingSession::from_config(
        &config_for(&server),
        Arc::new(StaticLocationSource::new(0.5, 0.5)),
        Arc::new(RecordingHost::default()),
        None,
    )
    .unwrap();

    let handle = session
        .start_tracking("org-key", "stale-token", "cust-1", None)
        .await
        .unwrap()
        .expect("session started");
    let summary = tokio::time::timeout(Duration::from_secs(10), handle.wait())
        .await
        .expect("session finished");

    assert_eq!(summary.reports_failed, 3);
    assert_eq!(summary.reports_sent, 0);
    assert_eq!(session.report_stats().unwrap().snapshot().failed, 3);
}

#[tokio::test]
async fn config_500_never_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONFIG_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ADD_GEOTAG_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let host = Arc::new(RecordingHost::default());
    let session = TrackingSession::from_config(
        &config_for(&server),
        Arc::new(StaticLocationSource::new(1.0, 1.0)),
        Arc::clone(&host) as Arc<dyn BackgroundHost>,
        None,
    )
    .unwrap();

    let started = session
        .start_tracking("org-key", "cust-token", "cust-1", None)
        .await
        .unwrap();
    assert!(started.is_none());
    assert!(host.events().is_empty());
}

#[tokio::test]
async fn missing_fields_use_fallbacks() {
    let server = MockServer::start().await;
    let body = json!({ "data": { "geotaggingPollingInterval": "2" } });
    Mock::given(method("GET"))
        .and(path(CONFIG_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let source = HttpConfigSource::new(&config.api, config.schedule).unwrap();
    let schedule = source.fetch_schedule("org-key").await.unwrap();

    assert_eq!(schedule.interval_hours, 2.0);
    assert_eq!(schedule.duration_days, 1.0);
    assert_eq!(schedule.spec().repeat_count(), 12);
}
