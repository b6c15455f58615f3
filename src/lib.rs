//! geotagger: background geotagging for address verification.
//!
//! A tracking session runs untethered from any UI: it fetches the
//! organization's polling schedule, then on every tick reads the device's
//! last known location, resolves it to a street address and posts both to
//! the verification API, until the session timeout elapses or it is stopped.
//!
//! # Architecture
//!
//! Leaves first:
//! - **Location**: last known fix, or nothing ([`location`])
//! - **Geocoder**: coordinates to address, never failing ([`geocoder`],
//!   backed by the `geotagger-geocode` crate)
//! - **Reporter**: one JSON report per tick ([`reporter`])
//! - **Scheduler**: the bounded tick loop ([`scheduler`])
//! - **Facade**: remote config fetch, then start/stop ([`tracking`])
//!
//! UI-observable callbacks cross to the host through [`foreground`]; the
//! host's background indicator is driven through [`background`].

pub mod api;
pub mod background;
pub mod config;
pub mod error;
pub mod foreground;
pub mod geocoder;
pub mod location;
pub mod logging;
pub mod remote_config;
pub mod reporter;
pub mod schedule;
pub mod scheduler;
pub mod tracking;

pub use background::{BackgroundHost, BackgroundNotice, TracingHost};
pub use config::GeotagConfig;
pub use error::{GeotagError, Result};
pub use location::{LocationSample, LocationSource, SharedLocationSource};
pub use schedule::{ScheduleSpec, TrackingRequest};
pub use scheduler::{LocationCallback, SessionEnd, SessionHandle, SessionSummary, TrackingScheduler};
pub use tracking::TrackingSession;
