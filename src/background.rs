//! Host background-execution capability.
//!
//! A tracking session must keep running after the UI goes away. Hosts that
//! need a user-visible indicator for that (a persistent notification, a
//! menu-bar item) implement [`BackgroundHost`]. The scheduler holds a
//! [`BackgroundActivity`] guard for the life of a session, so the indicator
//! is released on completion, cancellation and panic alike.
//!
//! Headless hosts use [`TracingHost`], which only logs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Text for the persistent "running in the background" indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundNotice {
    /// Platform notification channel id.
    pub channel_id: String,
    /// User-visible channel name.
    pub channel_name: String,
    pub title: String,
    pub text: String,
}

impl Default for BackgroundNotice {
    fn default() -> Self {
        Self {
            channel_id: "location_channel".to_owned(),
            channel_name: "Location Tracking".to_owned(),
            title: "Tracking location".to_owned(),
            text: "Sending location updates...".to_owned(),
        }
    }
}

/// Host-side hooks for a background tracking session.
///
/// Calls come from the scheduler's worker task, except
/// [`show_transient`](BackgroundHost::show_transient), which is always
/// delivered through the foreground queue.
pub trait BackgroundHost: Send + Sync {
    /// A session started: show the persistent indicator.
    fn enter_background(&self, session_id: Uuid, notice: &BackgroundNotice);

    /// Tick `tick` of `total` is starting.
    fn heartbeat(&self, session_id: Uuid, tick: u64, total: u64) {
        let _ = (session_id, tick, total);
    }

    /// The session ended or was cancelled: remove the indicator.
    fn exit_background(&self, session_id: Uuid);

    /// Show a short-lived message (toast).
    fn show_transient(&self, message: &str);
}

/// [`BackgroundHost`] that writes everything to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHost;

impl BackgroundHost for TracingHost {
    fn enter_background(&self, session_id: Uuid, notice: &BackgroundNotice) {
        info!(%session_id, channel = %notice.channel_id, "{}: {}", notice.title, notice.text);
    }

    fn heartbeat(&self, session_id: Uuid, tick: u64, total: u64) {
        debug!(%session_id, tick, total, "tracking tick");
    }

    fn exit_background(&self, session_id: Uuid) {
        info!(%session_id, "background tracking ended");
    }

    fn show_transient(&self, message: &str) {
        info!("{message}");
    }
}

/// Create the default host for this process.
pub fn create_host() -> Arc<dyn BackgroundHost> {
    Arc::new(TracingHost)
}

/// Transient message shown after a delivered report.
pub fn sending_location_message(latitude: f64, longitude: f64) -> String {
    format!("Sending Location from SourceID SDK: {latitude}, {longitude}")
}

/// Holds the host's background indicator until dropped.
pub struct BackgroundActivity {
    host: Arc<dyn BackgroundHost>,
    session_id: Uuid,
}

impl BackgroundActivity {
    /// Enter background mode for `session_id`.
    pub fn enter(
        host: Arc<dyn BackgroundHost>,
        session_id: Uuid,
        notice: &BackgroundNotice,
    ) -> Self {
        host.enter_background(session_id, notice);
        Self { host, session_id }
    }

    pub fn heartbeat(&self, tick: u64, total: u64) {
        self.host.heartbeat(self.session_id, tick, total);
    }
}

impl Drop for BackgroundActivity {
    fn drop(&mut self) {
        self.host.exit_background(self.session_id);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct LogHost {
        events: Mutex<Vec<String>>,
    }

    impl BackgroundHost for LogHost {
        fn enter_background(&self, _session_id: Uuid, notice: &BackgroundNotice) {
            self.events
                .lock()
                .unwrap()
                .push(format!("enter:{}", notice.title));
        }

        fn heartbeat(&self, _session_id: Uuid, tick: u64, total: u64) {
            self.events
                .lock()
                .unwrap()
                .push(format!("tick:{tick}/{total}"));
        }

        fn exit_background(&self, _session_id: Uuid) {
            self.events.lock().unwrap().push("exit".into());
        }

        fn show_transient(&self, message: &str) {
            self.events.lock().unwrap().push(message.to_owned());
        }
    }

    #[test]
    fn guard_enters_and_exits() {
        let host = Arc::new(LogHost::default());
        {
            let activity = BackgroundActivity::enter(
                host.clone(),
                Uuid::new_v4(),
                &BackgroundNotice::default(),
            );
            activity.heartbeat(1, 24);
        }
        let events = host.events.lock().unwrap().clone();
        assert_eq!(events, vec!["enter:Tracking location", "tick:1/24", "exit"]);
    }

    #[test]
    fn guard_exits_on_panic() {
        let host = Arc::new(LogHost::default());
        let guard_host: Arc<dyn BackgroundHost> = host.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _activity =
                BackgroundActivity::enter(guard_host, Uuid::new_v4(), &BackgroundNotice::default());
            panic!("tick blew up");
        }));
        assert!(result.is_err());
        assert_eq!(
            host.events.lock().unwrap().last().map(String::as_str),
            Some("exit")
        );
    }

    #[test]
    fn default_notice_text() {
        let notice = BackgroundNotice::default();
        assert_eq!(notice.channel_id, "location_channel");
        assert_eq!(notice.channel_name, "Location Tracking");
        assert_eq!(notice.text, "Sending location updates...");
    }

    #[test]
    fn sending_message_format() {
        assert_eq!(
            sending_location_message(6.5, 3.25),
            "Sending Location from SourceID SDK: 6.5, 3.25"
        );
    }

    #[test]
    fn tracing_host_accepts_all_calls() {
        let host = create_host();
        let id = Uuid::new_v4();
        host.enter_background(id, &BackgroundNotice::default());
        host.heartbeat(id, 1, 1);
        host.show_transient("hello");
        host.exit_background(id);
    }
}
