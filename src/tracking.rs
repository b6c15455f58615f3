//! Public entry point for background tracking.
//!
//! [`TrackingSession::start_tracking`] fetches the organization's schedule,
//! normalizes it and hands a request to the [`TrackingScheduler`]. A failed
//! fetch is logged and nothing starts. [`TrackingSession::stop_tracking`]
//! cancels both an in-flight fetch and the running session.
//!
//! Every start or stop bumps a generation counter. A start whose generation
//! has been superseded by the time its fetch completes never reaches the
//! scheduler.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::build_client;
use crate::background::BackgroundHost;
use crate::config::GeotagConfig;
use crate::error::Result;
use crate::foreground::ForegroundDispatcher;
use crate::geocoder::resolver_from_config;
use crate::location::LocationSource;
use crate::remote_config::{ConfigSource, HttpConfigSource};
use crate::reporter::{HttpReporter, ReportStats};
use crate::schedule::TrackingRequest;
use crate::scheduler::{LocationCallback, SessionHandle, TrackingScheduler};

#[derive(Debug, Default)]
struct StartupState {
    generation: u64,
    /// Cancels the in-flight config fetch, if any.
    startup: Option<CancellationToken>,
}

struct Inner {
    scheduler: TrackingScheduler,
    config_source: Arc<dyn ConfigSource>,
    stats: Option<Arc<ReportStats>>,
    state: Mutex<StartupState>,
    /// Serializes the final generation check with scheduler start/stop.
    handoff: tokio::sync::Mutex<()>,
}

/// Tracking facade. Cheap to clone; clones control the same session.
#[derive(Clone)]
pub struct TrackingSession {
    inner: Arc<Inner>,
}

impl TrackingSession {
    /// Build a facade from its parts.
    pub fn new(scheduler: TrackingScheduler, config_source: Arc<dyn ConfigSource>) -> Self {
        Self::with_parts(scheduler, config_source, None)
    }

    fn with_parts(
        scheduler: TrackingScheduler,
        config_source: Arc<dyn ConfigSource>,
        stats: Option<Arc<ReportStats>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                scheduler,
                config_source,
                stats,
                state: Mutex::new(StartupState::default()),
                handoff: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Build the HTTP-backed facade described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the geocoder cannot be built.
    pub fn from_config(
        config: &GeotagConfig,
        location: Arc<dyn LocationSource>,
        host: Arc<dyn BackgroundHost>,
        foreground: Option<ForegroundDispatcher>,
    ) -> Result<Self> {
        let client = build_client(&config.api)?;
        let reporter = HttpReporter::with_client(client.clone(), &config.api);
        let stats = reporter.stats();
        let config_source = HttpConfigSource::with_client(client, &config.api, config.schedule);
        let resolver = resolver_from_config(&config.geocoder)?;

        let mut scheduler = TrackingScheduler::new(location, resolver, Arc::new(reporter))
            .with_host(host)
            .with_notice(config.notification.notice())
            .with_toast_on_success(config.notification.toast_on_success)
            .with_fallbacks(config.schedule);
        if let Some(dispatcher) = foreground {
            scheduler = scheduler.with_foreground(dispatcher);
        }

        Ok(Self::with_parts(
            scheduler,
            Arc::new(config_source),
            Some(stats),
        ))
    }

    /// Fetch the remote schedule for `api_key`, then start tracking.
    ///
    /// Cancels any start still waiting on its config fetch. The running
    /// session, if any, is replaced only once the new fetch succeeds. The
    /// returned task yields the started session, or `None` if the fetch
    /// failed or a later start/stop superseded this one; it may be dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_tracking(
        &self,
        api_key: impl Into<String>,
        token: impl Into<String>,
        customer_id: impl Into<String>,
        on_location_post: Option<LocationCallback>,
    ) -> JoinHandle<Option<SessionHandle>> {
        let request = TrackingRequest::new(api_key, token, customer_id);
        let (generation, startup) = self.inner.begin_startup();
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let fetched = tokio::select! {
                biased;
                _ = startup.cancelled() => {
                    debug!(generation, "tracking start superseded during config fetch");
                    return None;
                }
                fetched = inner.config_source.fetch_schedule(&request.api_key) => fetched,
            };

            let schedule = match fetched {
                Ok(schedule) => schedule,
                Err(e) => {
                    warn!(error = %e, "remote config unavailable, tracking not started");
                    return None;
                }
            };
            inner
                .hand_off(generation, schedule.apply(request), on_location_post)
                .await
        })
    }

    /// Start tracking with a caller-supplied schedule, skipping the fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_tracking_with(
        &self,
        request: TrackingRequest,
        on_location_post: Option<LocationCallback>,
    ) -> JoinHandle<Option<SessionHandle>> {
        let (generation, _startup) = self.inner.begin_startup();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.hand_off(generation, request, on_location_post).await })
    }

    /// Cancel any pending start and stop the running session. Idempotent.
    ///
    /// Returns once the session loop has exited.
    pub async fn stop_tracking(&self) {
        {
            let mut state = self.inner.lock_state();
            state.generation += 1;
            if let Some(startup) = state.startup.take() {
                startup.cancel();
            }
        }
        let _handoff = self.inner.handoff.lock().await;
        self.inner.scheduler.stop_active().await;
    }

    /// The running session, if any.
    pub async fn active_session(&self) -> Option<SessionHandle> {
        self.inner.scheduler.active().await
    }

    pub fn scheduler(&self) -> &TrackingScheduler {
        &self.inner.scheduler
    }

    /// Report delivery counters, when built with [`from_config`](Self::from_config).
    pub fn report_stats(&self) -> Option<Arc<ReportStats>> {
        self.inner.stats.clone()
    }
}

impl Inner {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, StartupState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Supersede any pending start and claim a new generation.
    fn begin_startup(&self) -> (u64, CancellationToken) {
        let mut state = self.lock_state();
        if let Some(previous) = state.startup.take() {
            previous.cancel();
        }
        state.generation += 1;
        let token = CancellationToken::new();
        state.startup = Some(token.clone());
        (state.generation, token)
    }

    fn current_generation(&self) -> u64 {
        self.lock_state().generation
    }

    async fn hand_off(
        &self,
        generation: u64,
        request: TrackingRequest,
        on_location_post: Option<LocationCallback>,
    ) -> Option<SessionHandle> {
        let _handoff = self.handoff.lock().await;
        if self.current_generation() != generation {
            debug!(generation, "tracking start superseded before hand-off");
            return None;
        }
        let handle = self.scheduler.start(request, on_location_post).await;
        info!(session_id = %handle.id(), schedule = %handle.schedule(), "tracking started");
        Some(handle)
    }
}
