//! Foreground delivery of UI-observable callbacks.
//!
//! Worker tasks never call UI code directly. They hand closures to a
//! [`ForegroundDispatcher`]; the host drains the paired [`ForegroundQueue`]
//! on its UI thread (or, headless, on the main task).

use tokio::sync::mpsc;
use tracing::trace;

/// A unit of work to run on the foreground.
pub type ForegroundJob = Box<dyn FnOnce() + Send + 'static>;

/// Create a connected dispatcher/queue pair.
pub fn channel() -> (ForegroundDispatcher, ForegroundQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ForegroundDispatcher { tx }, ForegroundQueue { rx })
}

/// Sending half. Cheap to clone.
#[derive(Clone)]
pub struct ForegroundDispatcher {
    tx: mpsc::UnboundedSender<ForegroundJob>,
}

impl ForegroundDispatcher {
    /// Queue `job` for the foreground. Returns `false` if the queue is gone.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) -> bool {
        let sent = self.tx.send(Box::new(job)).is_ok();
        if !sent {
            trace!("foreground queue closed, dropping job");
        }
        sent
    }

    /// Returns `true` once the queue has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half, owned by the foreground.
pub struct ForegroundQueue {
    rx: mpsc::UnboundedReceiver<ForegroundJob>,
}

impl ForegroundQueue {
    /// Wait for the next job and run it. Returns `false` once every
    /// dispatcher has been dropped and the queue is empty.
    pub async fn run_one(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run jobs until every dispatcher has been dropped.
    pub async fn run(mut self) {
        while self.run_one().await {}
    }

    /// Run every job already queued without waiting. Returns how many ran.
    pub fn drain(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }
}
