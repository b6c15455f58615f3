//! Session handles and end-of-session summaries.

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::schedule::ScheduleSpec;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// Every scheduled tick ran.
    Completed,
    /// Stopped, replaced by a newer session, or torn down with its runtime.
    Cancelled,
}

/// Counters published when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    /// Ticks that ran to completion, whatever their outcome.
    pub ticks_run: u64,
    pub reports_sent: u64,
    pub reports_failed: u64,
    /// Ticks with no location sample.
    pub ticks_skipped: u64,
    pub end: SessionEnd,
}

impl SessionSummary {
    pub(crate) fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            ticks_run: 0,
            reports_sent: 0,
            reports_failed: 0,
            ticks_skipped: 0,
            end: SessionEnd::Completed,
        }
    }
}

/// Cloneable reference to one running (or finished) session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    schedule: ScheduleSpec,
    cancel: CancellationToken,
    done: watch::Receiver<Option<SessionSummary>>,
}

impl SessionHandle {
    pub(crate) fn new(
        id: Uuid,
        schedule: ScheduleSpec,
        cancel: CancellationToken,
        done: watch::Receiver<Option<SessionSummary>>,
    ) -> Self {
        Self {
            id,
            schedule,
            cancel,
            done,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The normalized schedule this session runs.
    pub fn schedule(&self) -> ScheduleSpec {
        self.schedule
    }

    /// Request cancellation. The loop stops at its next suspension point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns `true` once the session loop has exited.
    pub fn is_finished(&self) -> bool {
        self.done.borrow().is_some()
    }

    /// The summary, if the session has ended.
    pub fn summary(&self) -> Option<SessionSummary> {
        self.done.borrow().clone()
    }

    /// Wait for the session to end.
    ///
    /// If the session task was torn down without publishing (runtime
    /// shutdown), an empty cancelled summary is returned.
    pub async fn wait(&self) -> SessionSummary {
        let mut done = self.done.clone();
        let published = done
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|summary| summary.clone());
        published.unwrap_or_else(|| SessionSummary {
            end: SessionEnd::Cancelled,
            ..SessionSummary::new(self.id)
        })
    }
}
