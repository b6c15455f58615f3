//! Shared fakes for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use geotagger::background::BackgroundHost;
use geotagger::error::{GeotagError, Result};
use geotagger::geocoder::AddressResolver;
use geotagger::location::{LocationSample, LocationSource, LocationUnavailable};
use geotagger::remote_config::{ConfigSource, RemoteSchedule};
use geotagger::reporter::{Report, ReportTransport};
use geotagger::{BackgroundNotice, TrackingScheduler, TrackingSession};
use geotagger_geocode::ParsedAddress;
use tokio::time::Instant;
use uuid::Uuid;

/// Reports no fix for the first `absent` reads, then a fixed position.
pub(crate) struct SequenceLocation {
    absent: usize,
    reads: AtomicUsize,
    fix: (f64, f64),
}

impl SequenceLocation {
    pub(crate) fn new(absent: usize, latitude: f64, longitude: f64) -> Self {
        Self {
            absent,
            reads: AtomicUsize::new(0),
            fix: (latitude, longitude),
        }
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationSource for SequenceLocation {
    async fn last_known_location(
        &self,
    ) -> std::result::Result<LocationSample, LocationUnavailable> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst);
        if read < self.absent {
            Err(LocationUnavailable::NoFix)
        } else {
            Ok(LocationSample::new(self.fix.0, self.fix.1))
        }
    }
}

/// Always resolves to the same street.
pub(crate) struct FixedResolver;

#[async_trait]
impl AddressResolver for FixedResolver {
    async fn reverse_geocode(&self, _latitude: f64, _longitude: f64) -> ParsedAddress {
        ParsedAddress {
            address_line_one: Some("Admiralty Way".into()),
            address_line_two: Some("12".into()),
            city: Some("Lagos".into()),
            ..ParsedAddress::default()
        }
    }
}

/// Records every report with the paused-clock instant it was sent at.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<(Instant, Report)>>,
    pub(crate) fail_with: Option<u16>,
}

impl RecordingTransport {
    pub(crate) fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<(Instant, Report)> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ReportTransport for RecordingTransport {
    async fn send(&self, report: &Report, _api_key: &str, _token: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((Instant::now(), report.clone()));
        match self.fail_with {
            Some(status) => Err(GeotagError::ReportDelivery {
                status: Some(status),
                message: "rejected".into(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HostEvent {
    Enter(Uuid),
    Exit(Uuid),
    Toast(String),
}

/// Background host that records indicator transitions and toasts.
#[derive(Default)]
pub(crate) struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
    pub(crate) fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Sessions whose indicator was entered but not yet exited.
    pub(crate) fn held(&self) -> Vec<Uuid> {
        let mut held = Vec::new();
        for event in self.events() {
            match event {
                HostEvent::Enter(id) => held.push(id),
                HostEvent::Exit(id) => held.retain(|h| *h != id),
                HostEvent::Toast(_) => {}
            }
        }
        held
    }
}

impl BackgroundHost for RecordingHost {
    fn enter_background(&self, session_id: Uuid, _notice: &BackgroundNotice) {
        self.events
            .lock()
            .unwrap()
            .push(HostEvent::Enter(session_id));
    }

    fn exit_background(&self, session_id: Uuid) {
        self.events
            .lock()
            .unwrap()
            .push(HostEvent::Exit(session_id));
    }

    fn show_transient(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(HostEvent::Toast(message.to_owned()));
    }
}

/// Config source answering every fetch with the same outcome.
pub(crate) struct FixedConfig {
    schedule: Option<RemoteSchedule>,
    calls: AtomicUsize,
}

impl FixedConfig {
    pub(crate) fn ok(interval_hours: f64, duration_days: f64) -> Self {
        Self {
            schedule: Some(RemoteSchedule {
                interval_hours,
                duration_days,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn server_error() -> Self {
        Self {
            schedule: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigSource for FixedConfig {
    async fn fetch_schedule(&self, _api_key: &str) -> Result<RemoteSchedule> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.schedule
            .ok_or_else(|| GeotagError::ConfigFetch("HTTP 500: internal error".into()))
    }
}

/// Everything a facade test needs to observe.
pub(crate) struct Harness {
    pub(crate) session: TrackingSession,
    pub(crate) location: Arc<SequenceLocation>,
    pub(crate) transport: Arc<RecordingTransport>,
    pub(crate) host: Arc<RecordingHost>,
    pub(crate) config: Arc<FixedConfig>,
}

pub(crate) fn harness(config: FixedConfig, location: SequenceLocation) -> Harness {
    harness_with(config, location, RecordingTransport::default())
}

pub(crate) fn harness_with(
    config: FixedConfig,
    location: SequenceLocation,
    transport: RecordingTransport,
) -> Harness {
    let location = Arc::new(location);
    let transport = Arc::new(transport);
    let host = Arc::new(RecordingHost::default());
    let config = Arc::new(config);

    let scheduler = TrackingScheduler::new(
        Arc::clone(&location) as Arc<dyn LocationSource>,
        Arc::new(FixedResolver),
        Arc::clone(&transport) as Arc<dyn ReportTransport>,
    )
    .with_host(Arc::clone(&host) as Arc<dyn BackgroundHost>);
    let session = TrackingSession::new(scheduler, Arc::clone(&config) as Arc<dyn ConfigSource>);

    Harness {
        session,
        location,
        transport,
        host,
        config,
    }
}
