//! Tracking session loop.
//!
//! [`TrackingScheduler::start`] spawns a tokio task that runs exactly
//! `repeat_count` ticks. Each tick reads the last known location, resolves
//! an address and sends one report, then waits the interval:
//!
//! ```text
//! tick 1 ─ wait ─ tick 2 ─ wait ─ … ─ tick N ─ wait ─ done
//! ```
//!
//! A missing location skips the report but still counts as a tick. Geocode
//! and delivery failures are logged and swallowed. Cancellation is observed
//! between ticks, inside a tick, and during the wait.
//!
//! At most one session runs per scheduler: starting a new one cancels the
//! previous session and waits for its task to exit first.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::background::{
    BackgroundActivity, BackgroundHost, BackgroundNotice, create_host, sending_location_message,
};
use crate::config::ScheduleConfig;
use crate::error::{GeotagError, Result};
use crate::foreground::ForegroundDispatcher;
use crate::geocoder::AddressResolver;
use crate::location::{LocationSample, LocationSource};
use crate::reporter::{Report, ReportTransport};
use crate::schedule::{ScheduleSpec, TrackingRequest};
use crate::scheduler::session::{SessionEnd, SessionHandle, SessionSummary};

/// Called with `(latitude, longitude)` after each delivered report.
pub type LocationCallback = Arc<dyn Fn(f64, f64) + Send + Sync>;

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    /// No location sample; nothing was sent.
    Skipped,
    Delivered,
    Failed,
}

struct ActiveSession {
    handle: SessionHandle,
    task: JoinHandle<()>,
}

/// Drives tracking sessions.
pub struct TrackingScheduler {
    /// Last-known-location provider.
    location: Arc<dyn LocationSource>,
    /// Reverse geocoder (never fails).
    resolver: Arc<dyn AddressResolver>,
    /// Report delivery.
    transport: Arc<dyn ReportTransport>,
    /// Background indicator and transient messages.
    host: Arc<dyn BackgroundHost>,
    /// Where UI callbacks are delivered. `None` runs them on the worker.
    foreground: Option<ForegroundDispatcher>,
    notice: BackgroundNotice,
    toast_on_success: bool,
    fallbacks: ScheduleConfig,
    /// The single active-session slot.
    active: Mutex<Option<ActiveSession>>,
}

impl TrackingScheduler {
    /// Create a scheduler with the logging host and default notice.
    pub fn new(
        location: Arc<dyn LocationSource>,
        resolver: Arc<dyn AddressResolver>,
        transport: Arc<dyn ReportTransport>,
    ) -> Self {
        Self {
            location,
            resolver,
            transport,
            host: create_host(),
            foreground: None,
            notice: BackgroundNotice::default(),
            toast_on_success: true,
            fallbacks: ScheduleConfig::default(),
            active: Mutex::new(None),
        }
    }

    /// Use a platform host for the background indicator and toasts.
    pub fn with_host(mut self, host: Arc<dyn BackgroundHost>) -> Self {
        self.host = host;
        self
    }

    /// Deliver callbacks and toasts through `dispatcher`.
    pub fn with_foreground(mut self, dispatcher: ForegroundDispatcher) -> Self {
        self.foreground = Some(dispatcher);
        self
    }

    /// Set the persistent indicator text.
    pub fn with_notice(mut self, notice: BackgroundNotice) -> Self {
        self.notice = notice;
        self
    }

    /// Enable or disable the transient message after each delivered report.
    pub fn with_toast_on_success(mut self, enabled: bool) -> Self {
        self.toast_on_success = enabled;
        self
    }

    /// Override the schedule fallbacks.
    pub fn with_fallbacks(mut self, fallbacks: ScheduleConfig) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    /// Start a session, replacing any active one.
    ///
    /// The previous session is cancelled and its task awaited before the new
    /// one is spawned, so two loops never overlap. Must be called from within
    /// a tokio runtime.
    pub async fn start(
        &self,
        request: TrackingRequest,
        on_report: Option<LocationCallback>,
    ) -> SessionHandle {
        let mut slot = self.active.lock().await;
        if let Some(previous) = slot.take() {
            info!(session_id = %previous.handle.id(), "replacing active tracking session");
            previous.handle.cancel();
            join_session(previous).await;
        }

        let spec = ScheduleSpec::from_request(&request, &self.fallbacks);
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(None);
        let handle = SessionHandle::new(id, spec, cancel.clone(), done_rx);

        let activity = BackgroundActivity::enter(Arc::clone(&self.host), id, &self.notice);
        let run = SessionRun {
            id,
            spec,
            request,
            cancel,
            on_report,
            location: Arc::clone(&self.location),
            resolver: Arc::clone(&self.resolver),
            transport: Arc::clone(&self.transport),
            host: Arc::clone(&self.host),
            foreground: self.foreground.clone(),
            toast_on_success: self.toast_on_success,
        };
        let task = tokio::spawn(run.run(activity, done_tx));

        *slot = Some(ActiveSession {
            handle: handle.clone(),
            task,
        });
        handle
    }

    /// Stop `handle`'s session and wait for its loop to exit.
    ///
    /// Stopping a session that already ended, or that is no longer the
    /// active one, only cancels its token.
    pub async fn stop(&self, handle: &SessionHandle) {
        handle.cancel();
        let mut slot = self.active.lock().await;
        if slot.as_ref().is_some_and(|a| a.handle.id() == handle.id()) {
            if let Some(active) = slot.take() {
                join_session(active).await;
            }
        }
    }

    /// Stop whatever session is active. Idempotent.
    pub async fn stop_active(&self) {
        let mut slot = self.active.lock().await;
        if let Some(active) = slot.take() {
            info!(session_id = %active.handle.id(), "stopping tracking session");
            active.handle.cancel();
            join_session(active).await;
        }
    }

    /// The running session, if any.
    pub async fn active(&self) -> Option<SessionHandle> {
        let slot = self.active.lock().await;
        slot.as_ref()
            .map(|a| a.handle.clone())
            .filter(|h| !h.is_finished())
    }
}

impl Drop for TrackingScheduler {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.handle.cancel();
        }
    }
}

async fn join_session(session: ActiveSession) {
    if let Err(e) = session.task.await {
        error!(session_id = %session.handle.id(), error = %e, "tracking session task failed");
    }
}

/// Everything one session loop needs, moved into its task.
struct SessionRun {
    id: Uuid,
    spec: ScheduleSpec,
    request: TrackingRequest,
    cancel: CancellationToken,
    on_report: Option<LocationCallback>,
    location: Arc<dyn LocationSource>,
    resolver: Arc<dyn AddressResolver>,
    transport: Arc<dyn ReportTransport>,
    host: Arc<dyn BackgroundHost>,
    foreground: Option<ForegroundDispatcher>,
    toast_on_success: bool,
}

impl SessionRun {
    async fn run(
        self,
        activity: BackgroundActivity,
        done: watch::Sender<Option<SessionSummary>>,
    ) {
        let total = self.spec.repeat_count();
        let mut summary = SessionSummary::new(self.id);
        info!(session_id = %self.id, schedule = %self.spec, "tracking session started");

        for tick in 1..=total {
            if self.cancel.is_cancelled() {
                summary.end = SessionEnd::Cancelled;
                break;
            }
            activity.heartbeat(tick, total);

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                outcome = self.tick(tick) => Some(outcome),
            };
            let Some(outcome) = outcome else {
                summary.end = SessionEnd::Cancelled;
                break;
            };

            summary.ticks_run += 1;
            match outcome {
                TickOutcome::Skipped => summary.ticks_skipped += 1,
                TickOutcome::Delivered => summary.reports_sent += 1,
                TickOutcome::Failed => summary.reports_failed += 1,
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    summary.end = SessionEnd::Cancelled;
                    break;
                }
                _ = tokio::time::sleep(self.spec.interval()) => {}
            }
        }

        drop(activity);
        info!(
            session_id = %self.id,
            ticks_run = summary.ticks_run,
            reports_sent = summary.reports_sent,
            reports_failed = summary.reports_failed,
            ticks_skipped = summary.ticks_skipped,
            end = ?summary.end,
            "tracking session ended"
        );
        done.send_replace(Some(summary));
    }

    async fn tick(&self, tick: u64) -> TickOutcome {
        match self.report_once().await {
            Ok(sample) => {
                debug!(session_id = %self.id, tick, "report delivered");
                self.notify_delivered(sample.latitude, sample.longitude);
                TickOutcome::Delivered
            }
            Err(GeotagError::LocationUnavailable(reason)) => {
                info!(session_id = %self.id, tick, %reason, "no location, skipping report");
                TickOutcome::Skipped
            }
            Err(e) => {
                warn!(session_id = %self.id, tick, error = %e, "report not delivered");
                TickOutcome::Failed
            }
        }
    }

    /// Location, address, report. Returns the sample that was reported.
    async fn report_once(&self) -> Result<LocationSample> {
        let sample = self.location.last_known_location().await?;
        let address = self
            .resolver
            .reverse_geocode(sample.latitude, sample.longitude)
            .await;
        let report = Report::new(&self.request.customer_id, &sample, &address);
        self.transport
            .send(&report, &self.request.api_key, &self.request.token)
            .await?;
        Ok(sample)
    }

    fn notify_delivered(&self, latitude: f64, longitude: f64) {
        if let Some(callback) = &self.on_report {
            let callback = Arc::clone(callback);
            self.on_foreground(move || callback(latitude, longitude));
        }
        if self.toast_on_success {
            let host = Arc::clone(&self.host);
            let message = sending_location_message(latitude, longitude);
            self.on_foreground(move || host.show_transient(&message));
        }
    }

    fn on_foreground(&self, job: impl FnOnce() + Send + 'static) {
        match &self.foreground {
            Some(dispatcher) => {
                dispatcher.dispatch(job);
            }
            None => job(),
        }
    }
}
