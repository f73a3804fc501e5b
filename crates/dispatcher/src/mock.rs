//! Mock collaborators for exercising the dispatcher without a network
//!
//! - [`ScriptedTransport`]: replays outcomes and records every batch it saw
//! - [`RecordingClock`]: records requested delays, returns immediately
//! - [`CollectingObserver`]: keeps every terminal report

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use contracts::{
    Clock, DeliveryReport, ObserverSink, SendOutcome, Telemetry, TelemetryBatch, Transport,
};
use tokio::sync::Notify;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

type Responder<T> = Box<dyn Fn(&TelemetryBatch<T>) -> SendOutcome + Send + Sync>;

/// Transport that answers from a script or a closure
pub struct ScriptedTransport<T> {
    name: String,
    responder: Responder<T>,
    sent: Mutex<Vec<TelemetryBatch<T>>>,
    latency: Duration,
}

impl<T: Telemetry> ScriptedTransport<T> {
    /// Replay `script` in order, then answer `Success` forever
    pub fn scripted(script: Vec<SendOutcome>) -> Self {
        let queue = Mutex::new(VecDeque::from(script));
        Self::from_fn(move |_| lock(&queue).pop_front().unwrap_or(SendOutcome::Success))
    }

    /// Always succeed
    pub fn accepting() -> Self {
        Self::from_fn(|_| SendOutcome::Success)
    }

    /// Decide per batch
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&TelemetryBatch<T>) -> SendOutcome + Send + Sync + 'static,
    {
        Self {
            name: "scripted".to_string(),
            responder: Box::new(responder),
            sent: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// Make every send take `latency` of real time
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Batches passed to `send`, in call order
    pub fn sent(&self) -> Vec<TelemetryBatch<T>> {
        lock(&self.sent).clone()
    }

    /// Sizes of the batches passed to `send`, in call order
    pub fn sent_sizes(&self) -> Vec<usize> {
        lock(&self.sent).iter().map(TelemetryBatch::len).collect()
    }

    pub fn send_count(&self) -> usize {
        lock(&self.sent).len()
    }
}

impl<T: Telemetry> Transport<T> for ScriptedTransport<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, batch: &TelemetryBatch<T>) -> SendOutcome {
        lock(&self.sent).push(batch.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        (self.responder)(batch)
    }
}

/// Clock that records each requested delay and does not wait
#[derive(Debug, Default)]
pub struct RecordingClock {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    pub fn delays(&self) -> Vec<Duration> {
        lock(&self.delays).clone()
    }
}

impl Clock for RecordingClock {
    async fn sleep(&self, delay: Duration) {
        lock(&self.delays).push(delay);
        tokio::task::yield_now().await;
    }
}

/// Observer that stores every report
#[derive(Debug, Default)]
pub struct CollectingObserver {
    reports: Mutex<Vec<DeliveryReport>>,
    notify: Notify,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<DeliveryReport> {
        lock(&self.reports).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.reports).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `count` reports arrived
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.len() >= count {
                return;
            }
            notified.await;
        }
    }
}

impl ObserverSink for CollectingObserver {
    fn on_terminal_outcome(&self, report: DeliveryReport) {
        lock(&self.reports).push(report);
        self.notify.notify_waiters();
    }
}
