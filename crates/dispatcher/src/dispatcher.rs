//! BatchDispatcher - entry point for asynchronous batch delivery

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{Clock, LineageId, ObserverSink, Telemetry, TelemetryBatch, Transport};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};

use crate::clock::TokioClock;
use crate::error::DispatcherError;
use crate::handle::DispatchHandle;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::policy::RetryPolicy;
use crate::stream::{spawn_stream, DispatchStream, StreamContext};

/// Builder for creating a BatchDispatcher
pub struct BatchDispatcherBuilder<Tr, O, C = TokioClock> {
    transport: Tr,
    observer: O,
    clock: C,
    policy: RetryPolicy,
}

impl<Tr, O> BatchDispatcherBuilder<Tr, O, TokioClock> {
    /// Create a new builder with the default retry policy and the tokio clock
    pub fn new(transport: Tr, observer: O) -> Self {
        Self {
            transport,
            observer,
            clock: TokioClock,
            policy: RetryPolicy::default(),
        }
    }
}

impl<Tr, O, C> BatchDispatcherBuilder<Tr, O, C> {
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the delay scheduler
    pub fn clock<C2>(self, clock: C2) -> BatchDispatcherBuilder<Tr, O, C2> {
        BatchDispatcherBuilder {
            transport: self.transport,
            observer: self.observer,
            clock,
            policy: self.policy,
        }
    }

    /// Build the dispatcher
    pub fn build<T>(self) -> BatchDispatcher<T, Tr, O, C>
    where
        T: Telemetry,
        Tr: Transport<T> + Sync + 'static,
        O: ObserverSink,
        C: Clock + Sync + 'static,
    {
        debug!(
            base_delay_ms = self.policy.base_delay().as_millis() as u64,
            max_delay_ms = self.policy.max_delay().as_millis() as u64,
            jitter = ?self.policy.jitter(),
            "Building batch dispatcher"
        );

        BatchDispatcher {
            ctx: Arc::new(StreamContext {
                transport: self.transport,
                observer: self.observer,
                clock: self.clock,
                policy: self.policy,
                metrics: Arc::new(DispatchMetrics::new()),
                tracker: TaskTracker::new(),
                idle: Notify::new(),
            }),
            shutdown_token: CancellationToken::new(),
            next_root: Arc::new(AtomicU64::new(1)),
            _records: PhantomData,
        }
    }
}

/// Result of [`BatchDispatcher::shutdown`]
#[derive(Debug, Clone, Copy)]
pub struct ShutdownReport {
    /// All streams finished within the grace period
    pub drained: bool,
    /// Metrics after every stream stopped
    pub metrics: MetricsSnapshot,
}

/// Dispatches telemetry batches with adaptive retry
///
/// Cheap to clone; clones share the same transport, observer and streams.
/// Must be used from within a tokio runtime.
pub struct BatchDispatcher<T, Tr, O, C = TokioClock> {
    ctx: Arc<StreamContext<Tr, O, C>>,
    shutdown_token: CancellationToken,
    next_root: Arc<AtomicU64>,
    _records: PhantomData<fn(T)>,
}

impl<T, Tr, O, C> Clone for BatchDispatcher<T, Tr, O, C> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            shutdown_token: self.shutdown_token.clone(),
            next_root: Arc::clone(&self.next_root),
            _records: PhantomData,
        }
    }
}

impl<T, Tr, O> BatchDispatcher<T, Tr, O, TokioClock>
where
    T: Telemetry,
    Tr: Transport<T> + Sync + 'static,
    O: ObserverSink,
{
    /// Dispatcher with the default policy and the tokio clock
    pub fn new(transport: Tr, observer: O) -> Self {
        BatchDispatcherBuilder::new(transport, observer).build()
    }
}

impl<T, Tr, O, C> BatchDispatcher<T, Tr, O, C>
where
    T: Telemetry,
    Tr: Transport<T> + Sync + 'static,
    O: ObserverSink,
    C: Clock + Sync + 'static,
{
    /// Hand `batch` over for delivery
    ///
    /// Returns as soon as the dispatch stream is spawned. Remote failures
    /// never surface here; they are retried or reported to the observer.
    ///
    /// # Errors
    /// - [`DispatcherError::EmptyBatch`] if the batch has no records
    /// - [`DispatcherError::ShuttingDown`] once shutdown has started
    pub fn dispatch(&self, batch: TelemetryBatch<T>) -> Result<DispatchHandle, DispatcherError> {
        if batch.is_empty() {
            return Err(DispatcherError::EmptyBatch);
        }
        if self.ctx.tracker.is_closed() {
            return Err(DispatcherError::ShuttingDown);
        }

        let lineage = LineageId::root(self.next_root.fetch_add(1, Ordering::Relaxed));
        let token = self.shutdown_token.child_token();

        debug!(
            lineage = %lineage,
            records = batch.len(),
            kind = %batch.kind(),
            "Dispatching batch"
        );

        spawn_stream(
            Arc::clone(&self.ctx),
            DispatchStream::new(batch, lineage.clone()),
            token.clone(),
        );

        Ok(DispatchHandle::new(lineage, token))
    }

    /// Get shared metrics
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.ctx.metrics
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.ctx.policy
    }

    pub fn transport(&self) -> &Tr {
        &self.ctx.transport
    }

    pub fn observer(&self) -> &O {
        &self.ctx.observer
    }

    pub fn clock(&self) -> &C {
        &self.ctx.clock
    }

    /// Wait until no dispatch stream is running
    ///
    /// Returns immediately when idle. Streams dispatched concurrently with
    /// this call may or may not be waited for.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.ctx.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.ctx.metrics.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stop accepting batches and wind down running streams
    ///
    /// Streams keep retrying for up to `grace`; whatever is still running
    /// afterwards is cancelled and reports `Cancelled` at its next
    /// suspension point.
    #[instrument(name = "dispatcher_shutdown", skip(self), fields(grace_ms = grace.as_millis() as u64))]
    pub async fn shutdown(&self, grace: Duration) -> ShutdownReport {
        self.ctx.tracker.close();
        info!(in_flight = self.ctx.metrics.in_flight(), "Dispatcher shutting down");

        let drained = tokio::time::timeout(grace, self.ctx.tracker.wait())
            .await
            .is_ok();

        if !drained {
            warn!(
                in_flight = self.ctx.metrics.in_flight(),
                "Grace period elapsed, cancelling remaining streams"
            );
            self.shutdown_token.cancel();
            self.ctx.tracker.wait().await;
        }

        let metrics = self.ctx.metrics.snapshot();
        info!(
            drained,
            delivered = metrics.delivered_count,
            failed = metrics.failed_count,
            cancelled = metrics.cancelled_count,
            "Dispatcher shutdown complete"
        );

        ShutdownReport { drained, metrics }
    }
}
