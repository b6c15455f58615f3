//! Device location access.
//!
//! The scheduler only ever asks for the last known fix. Platform layers feed
//! fixes and the permission state into a [`SharedLocationSource`]; tools and
//! demos use a [`StaticLocationSource`].

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geotagger_geocode::Coordinates;

/// One location fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in metres, if the provider reports one.
    pub accuracy_m: Option<f32>,
    /// When the fix was taken.
    pub captured_at: DateTime<Utc>,
}

impl LocationSample {
    /// A fix taken now with unknown accuracy.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            captured_at: Utc::now(),
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f32) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Why no fix could be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationUnavailable {
    /// The user has not granted location permission.
    #[error("location permission not granted")]
    PermissionDenied,
    /// Permission is granted but no fix has been recorded yet.
    #[error("no last known fix")]
    NoFix,
    /// The platform provider reported an error.
    #[error("location provider error: {0}")]
    Provider(String),
}

/// Source of the device's last known location.
///
/// Platform providers may await their location service, so both methods are
/// async and run inside the scheduler's cancellable tick.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// The most recent fix, or the reason there is none.
    async fn last_known_location(&self) -> Result<LocationSample, LocationUnavailable>;

    /// The most recent fix, or `None`. Never errors.
    async fn current_location(&self) -> Option<LocationSample> {
        match self.last_known_location().await {
            Ok(sample) => Some(sample),
            Err(reason) => {
                tracing::debug!(%reason, "no location sample");
                None
            }
        }
    }
}

#[async_trait]
impl<T: LocationSource + ?Sized> LocationSource for Arc<T> {
    async fn last_known_location(&self) -> Result<LocationSample, LocationUnavailable> {
        (**self).last_known_location().await
    }
}

#[derive(Debug)]
struct SharedState {
    permission_granted: bool,
    last_fix: Option<LocationSample>,
}

/// Location source fed by the host platform.
///
/// Clones share state: the platform layer keeps one clone to push updates
/// while the scheduler reads another.
#[derive(Debug, Clone)]
pub struct SharedLocationSource {
    state: Arc<RwLock<SharedState>>,
}

impl Default for SharedLocationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedLocationSource {
    /// An empty source with permission not yet granted.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SharedState {
                permission_granted: false,
                last_fix: None,
            })),
        }
    }

    /// A source with permission granted and an initial fix.
    pub fn with_fix(sample: LocationSample) -> Self {
        let source = Self::new();
        source.set_permission(true);
        source.update_fix(sample);
        source
    }

    /// Record a new fix.
    pub fn update_fix(&self, sample: LocationSample) {
        if let Ok(mut state) = self.state.write() {
            state.last_fix = Some(sample);
        }
    }

    /// Forget the last fix (e.g. the platform reports location services off).
    pub fn clear_fix(&self) {
        if let Ok(mut state) = self.state.write() {
            state.last_fix = None;
        }
    }

    /// Update whether location permission is granted.
    pub fn set_permission(&self, granted: bool) {
        if let Ok(mut state) = self.state.write() {
            state.permission_granted = granted;
        }
    }
}

#[async_trait]
impl LocationSource for SharedLocationSource {
    async fn last_known_location(&self) -> Result<LocationSample, LocationUnavailable> {
        let state = self
            .state
            .read()
            .map_err(|_| LocationUnavailable::Provider("location state poisoned".into()))?;
        if !state.permission_granted {
            return Err(LocationUnavailable::PermissionDenied);
        }
        state.last_fix.ok_or(LocationUnavailable::NoFix)
    }
}

/// Always reports the same coordinates.
#[derive(Debug, Clone, Copy)]
pub struct StaticLocationSource {
    latitude: f64,
    longitude: f64,
}

impl StaticLocationSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[async_trait]
impl LocationSource for StaticLocationSource {
    async fn last_known_location(&self) -> Result<LocationSample, LocationUnavailable> {
        Ok(LocationSample::new(self.latitude, self.longitude))
    }
}
