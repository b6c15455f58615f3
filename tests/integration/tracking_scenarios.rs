//! End-to-end tracking sessions on a paused clock.
//!
//! The facade is wired to in-memory fakes so a full day of ticks runs
//! instantly while keeping exact tick spacing observable.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use geotagger::{LocationCallback, SessionEnd};
use tokio::time::Instant;

use crate::helpers::{
    FixedConfig, HostEvent, RecordingTransport, SequenceLocation, harness, harness_with,
};

const HOUR: Duration = Duration::from_secs(3_600);

#[tokio::test(start_paused = true)]
async fn hourly_for_a_day_sends_24_reports_an_hour_apart() {
    let h = harness(
        FixedConfig::ok(1.0, 1.0),
        SequenceLocation::new(0, 6.43, 3.42),
    );
    let started_at = Instant::now();

    let handle = h
        .session
        .start_tracking("org-key", "cust-token", "cust-1", None)
        .await
        .unwrap()
        .expect("session started");
    assert_eq!(handle.schedule().repeat_count(), 24);

    let summary = handle.wait().await;
    assert_eq!(summary.end, SessionEnd::Completed);
    assert_eq!(summary.ticks_run, 24);
    assert_eq!(summary.reports_sent, 24);

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 24);
    assert_eq!(sent[0].0, started_at);
    for pair in sent.windows(2) {
        assert_eq!(pair[1].0 - pair[0].0, HOUR);
    }

    let report = &sent[0].1;
    assert_eq!(report.identity, "cust-1");
    assert_eq!(report.latitude, 6.43);
    assert_eq!(report.longitude, 3.42);
    assert_eq!(report.address, "Admiralty Way 12");
    assert_eq!(h.config.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_falls_back_to_half_hour() {
    let h = harness(
        FixedConfig::ok(0.0, 2.0),
        SequenceLocation::new(0, 1.0, 1.0),
    );

    let handle = h
        .session
        .start_tracking("org-key", "cust-token", "cust-1", None)
        .await
        .unwrap()
        .expect("session started");
    assert_eq!(handle.schedule().interval(), HOUR / 2);
    assert_eq!(handle.schedule().repeat_count(), 96);

    let summary = handle.wait().await;
    assert_eq!(summary.ticks_run, 96);
    assert_eq!(h.transport.count(), 96);
}

#[tokio::test(start_paused = true)]
async fn config_server_error_starts_nothing() {
    let h = harness(
        FixedConfig::server_error(),
        SequenceLocation::new(0, 1.0, 1.0),
    );

    let started = h
        .session
        .start_tracking("org-key", "cust-token", "cust-1", None)
        .await
        .unwrap();
    assert!(started.is_none());

    tokio::time::sleep(48 * HOUR).await;
    assert_eq!(h.location.reads(), 0);
    assert_eq!(h.transport.count(), 0);
    assert!(h.host.events().is_empty());
    assert!(h.session.active_session().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn missing_fixes_skip_ticks_without_shifting_cadence() {
    let h = harness(
        FixedConfig::ok(1.0, 1.0),
        SequenceLocation::new(3, 9.08, 7.49),
    );
    let started_at = Instant::now();

    let handle = h
        .session
        .start_tracking("org-key", "cust-token", "cust-1", None)
        .await
        .unwrap()
        .expect("session started");
    let summary = handle.wait().await;

    assert_eq!(summary.ticks_run, 24);
    assert_eq!(summary.ticks_skipped, 3);
    assert_eq!(summary.reports_sent, 21);
    assert_eq!(h.location.reads(), 24);

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 21);
    assert_eq!(sent[0].0 - started_at, 3 * HOUR);
}

#[tokio::test(start_paused = true)]
async fn failed_reports_are_not_retried() {
    let h = harness_with(
        FixedConfig::ok(6.0, 1.0),
        SequenceLocation::new(0, 1.0, 1.0),
        RecordingTransport::failing(503),
    );

    let summary = h
        .session
        .start_tracking("org-key", "cust-token", "cust-1", None)
        .await
        .unwrap()
        .expect("session started")
        .wait()
        .await;

    assert_eq!(summary.ticks_run, 4);
    assert_eq!(summary.reports_failed, 4);
    assert_eq!(h.transport.count(), 4);
    let toasts = h
        .host
        .events()
        .into_iter()
        .filter(|e| matches!(e, HostEvent::Toast(_)))
        .count();
    assert_eq!(toasts, 0);
}

#[tokio::test(start_paused = true)]
async fn indicator_held_for_the_whole_session() {
    let h = harness(
        FixedConfig::ok(12.0, 1.0),
        SequenceLocation::new(0, 1.0, 1.0),
    );

    let handle = h
        .session
        .start_tracking("org-key", "cust-token", "cust-1", None)
        .await
        .unwrap()
        .expect("session started");
    assert_eq!(h.host.held(), vec![handle.id()]);

    tokio::time::sleep(13 * HOUR).await;
    assert_eq!(h.host.held(), vec![handle.id()]);

    handle.wait().await;
    assert!(h.host.held().is_empty());

    let events = h.host.events();
    assert_eq!(events.first(), Some(&HostEvent::Enter(handle.id())));
    assert_eq!(events.last(), Some(&HostEvent::Exit(handle.id())));
    assert!(events.contains(&HostEvent::Toast(
        "Sending Location from SourceID SDK: 1, 1".into()
    )));
}

#[tokio::test(start_paused = true)]
async fn callback_receives_each_delivered_position() {
    let h = harness(
        FixedConfig::ok(8.0, 1.0),
        SequenceLocation::new(1, -1.29, 36.82),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: LocationCallback =
        Arc::new(move |lat: f64, lng: f64| sink.lock().unwrap().push((lat, lng)));

    h.session
        .start_tracking("org-key", "cust-token", "cust-1", Some(callback))
        .await
        .unwrap()
        .expect("session started")
        .wait()
        .await;

    assert_eq!(*seen.lock().unwrap(), vec![(-1.29, 36.82); 2]);
}

#[tokio::test(start_paused = true)]
async fn stop_ends_session_and_releases_indicator() {
    let h = harness(
        FixedConfig::ok(1.0, 1.0),
        SequenceLocation::new(0, 1.0, 1.0),
    );
    let handle = h
        .session
        .start_tracking("org-key", "cust-token", "cust-1", None)
        .await
        .unwrap()
        .expect("session started");

    tokio::time::sleep(HOUR * 5 / 2).await;
    h.session.stop_tracking().await;

    let summary = handle.wait().await;
    assert_eq!(summary.end, SessionEnd::Cancelled);
    assert_eq!(summary.ticks_run, 3);
    assert!(h.host.held().is_empty());

    tokio::time::sleep(24 * HOUR).await;
    assert_eq!(h.transport.count(), 3);

    // again, and with nothing running
    h.session.stop_tracking().await;
    h.session.stop_tracking().await;
    assert!(h.session.active_session().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn second_start_replaces_running_session() {
    let h = harness(
        FixedConfig::ok(1.0, 1.0),
        SequenceLocation::new(0, 1.0, 1.0),
    );
    let first = h
        .session
        .start_tracking("org-key", "cust-token", "cust-1", None)
        .await
        .unwrap()
        .expect("first session");

    tokio::time::sleep(HOUR / 2).await;
    let second = h
        .session
        .start_tracking("org-key", "cust-token", "cust-2", None)
        .await
        .unwrap()
        .expect("second session");
    assert_ne!(first.id(), second.id());

    let first_summary = first.wait().await;
    assert_eq!(first_summary.end, SessionEnd::Cancelled);
    assert_eq!(first_summary.ticks_run, 1);
    assert_eq!(h.host.held(), vec![second.id()]);

    second.wait().await;
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 25);
    assert!(sent[1..].iter().all(|(_, r)| r.identity == "cust-2"));
    assert_eq!(h.config.calls(), 2);
}
