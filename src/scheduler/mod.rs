//! Tracking session scheduler.
//!
//! Runs one bounded repeat loop per session: location, address, report,
//! wait. See [`runner`] for the loop and [`session`] for handles.

pub mod runner;
pub mod session;

pub use runner::{LocationCallback, TrackingScheduler};
pub use session::{SessionEnd, SessionHandle, SessionSummary};
