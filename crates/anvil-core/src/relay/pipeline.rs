//! Relay pipeline: producer-side submission and consumer-side dispatch.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::message::{LogBatch, UpdateMessage};
use crate::queue::SyncQueue;

use super::types::RelaySinks;
use super::wake::{CondvarWake, NotifyWake, WakeSignal};

/// How long [`Relay::run_blocking`] waits for a wake before rechecking `stop`.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Consumer half of the relay. Owns the queue and dispatches drained messages
/// to the sinks; lives on the consumer thread.
pub struct Relay {
    queue: Arc<SyncQueue<UpdateMessage>>,
    wake: Arc<dyn WakeSignal>,
    sinks: RelaySinks,
}

impl Relay {
    /// Create a relay that signals `wake` on every submission.
    pub fn new(wake: Arc<dyn WakeSignal>, sinks: RelaySinks) -> Self {
        Self {
            queue: Arc::new(SyncQueue::new()),
            wake,
            sinks,
        }
    }

    /// Producer handle for background threads.
    pub fn handle(&self) -> RelayHandle {
        RelayHandle {
            queue: Arc::clone(&self.queue),
            wake: Arc::clone(&self.wake),
        }
    }

    /// Messages queued but not yet dispatched.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drain every queued message and dispatch each in FIFO order.
    ///
    /// Draining fully matters: wake signals coalesce, so one wake may stand
    /// for many submissions. Returns the number of messages dispatched.
    pub fn on_wake(&self) -> usize {
        let messages = self.queue.try_drain_all();
        let count = messages.len();
        if count == 0 {
            trace!("Wake with empty queue");
            return 0;
        }

        for message in messages {
            self.dispatch(message);
        }
        debug!(count, "Dispatched updates");
        count
    }

    fn dispatch(&self, message: UpdateMessage) {
        match message {
            UpdateMessage::ProfileSummary(text) => self.sinks.profiles.add_data(text),
            UpdateMessage::ProcessSummary(text) => self.sinks.processes.add_data(text),
            UpdateMessage::LogBatch(records) => self.sinks.logs.add_data(records),
            UpdateMessage::DiagnosticText(text) => self.sinks.diagnostics.write(&text),
            UpdateMessage::None => {}
        }
    }

    /// Async consumer loop: handle every wake until `shutdown` resolves, then
    /// drain once more so nothing submitted before shutdown is stranded.
    ///
    /// Returns the total number of messages dispatched.
    #[allow(clippy::future_not_send)] // sinks are consumer-thread only
    pub async fn run_until<F>(&self, wake: &NotifyWake, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut total = 0;
        loop {
            tokio::select! {
                biased;
                () = wake.signaled() => total += self.on_wake(),
                () = &mut shutdown => break,
            }
        }
        total += self.on_wake();
        info!(total, "Relay consumer stopped");
        total
    }

    /// Blocking consumer loop for a dedicated thread. Runs until `stop` is
    /// set, then performs a final drain.
    pub fn run_blocking(&self, wake: &CondvarWake, stop: &AtomicBool) -> usize {
        let mut total = 0;
        while !stop.load(Ordering::Acquire) {
            if wake.wait_timeout(STOP_POLL_INTERVAL) {
                total += self.on_wake();
            }
        }
        total += self.on_wake();
        info!(total, "Relay consumer stopped");
        total
    }
}

/// Producer half of the relay. Cheap to clone and safe to use from any
/// thread; submissions never block.
#[derive(Clone)]
pub struct RelayHandle {
    queue: Arc<SyncQueue<UpdateMessage>>,
    wake: Arc<dyn WakeSignal>,
}

impl RelayHandle {
    pub fn submit_profile_update(&self, text: impl Into<String>) {
        self.submit(UpdateMessage::profile_summary(text));
    }

    pub fn submit_process_update(&self, text: impl Into<String>) {
        self.submit(UpdateMessage::process_summary(text));
    }

    pub fn submit_log_update(&self, records: LogBatch) {
        self.submit(UpdateMessage::log_batch(records));
    }

    /// Route `text` to the diagnostic channel.
    pub fn submit_diagnostic(&self, text: impl Into<String>) {
        self.submit(UpdateMessage::diagnostic_text(text));
    }

    fn submit(&self, message: UpdateMessage) {
        trace!(kind = ?message.kind(), "Submitting update");
        self.queue.push(message);
        self.wake.signal();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[path = "pipeline_tests.rs"]
mod tests;
