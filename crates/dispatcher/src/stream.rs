//! Dispatch stream - one retry lineage from first attempt to terminal outcome

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    Clock, DeliveryReport, FailureReason, LineageId, ObserverSink, Telemetry, TelemetryBatch,
    TerminalOutcome, Transport,
};
use futures_util::FutureExt;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, instrument, trace, warn};

use crate::metrics::DispatchMetrics;
use crate::policy::{RetryAction, RetryPolicy};

/// Collaborators shared read-only by every stream of one dispatcher
pub(crate) struct StreamContext<Tr, O, C> {
    pub transport: Tr,
    pub observer: O,
    pub clock: C,
    pub policy: RetryPolicy,
    pub metrics: Arc<DispatchMetrics>,
    pub tracker: TaskTracker,
    /// Signalled whenever the last running stream finishes
    pub idle: Notify,
}

/// Stream-local attempt state
///
/// Owned exclusively by the task running the stream.
pub(crate) struct DispatchStream<T> {
    batch: TelemetryBatch<T>,
    lineage: LineageId,
    attempt: u32,
    backoff_step: u32,
    next_delay: Option<Duration>,
}

impl<T: Telemetry> DispatchStream<T> {
    pub fn new(batch: TelemetryBatch<T>, lineage: LineageId) -> Self {
        Self {
            batch,
            lineage,
            attempt: 0,
            backoff_step: 0,
            next_delay: None,
        }
    }

    /// Send until a terminal outcome, a split, or cancellation
    ///
    /// Returns `None` when the batch was handed off to two child streams.
    async fn drive<Tr, O, C>(
        &mut self,
        ctx: &Arc<StreamContext<Tr, O, C>>,
        token: &CancellationToken,
    ) -> Option<TerminalOutcome>
    where
        Tr: Transport<T> + Sync + 'static,
        O: ObserverSink,
        C: Clock + Sync + 'static,
    {
        loop {
            if token.is_cancelled() {
                return Some(TerminalOutcome::Cancelled);
            }

            self.attempt += 1;
            ctx.metrics.inc_send_count();
            let outcome = ctx.transport.send(&self.batch).await;
            trace!(
                lineage = %self.lineage,
                attempt = self.attempt,
                outcome = outcome.label(),
                "Send attempt finished"
            );

            match ctx.policy.decide(&outcome, self.backoff_step) {
                RetryAction::Complete => return Some(TerminalOutcome::Delivered),
                RetryAction::GiveUp(reason) => return Some(TerminalOutcome::Failed(reason)),
                RetryAction::RetryNow => {
                    self.next_delay = None;
                    ctx.metrics.inc_requested_wait_count();
                }
                RetryAction::RetryAfter {
                    delay,
                    advances_backoff,
                } => {
                    if advances_backoff {
                        self.backoff_step = self.backoff_step.saturating_add(1);
                        ctx.metrics.inc_backoff_count();
                    } else {
                        ctx.metrics.inc_requested_wait_count();
                    }
                    self.next_delay = Some(delay);
                    debug!(
                        lineage = %self.lineage,
                        attempt = self.attempt,
                        delay_ms = delay.as_millis() as u64,
                        backoff = advances_backoff,
                        "Retry scheduled"
                    );

                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Some(TerminalOutcome::Cancelled),
                        _ = ctx.clock.sleep(delay) => {}
                    }
                }
                RetryAction::Split => match self.batch.split() {
                    Some((first, second)) => {
                        ctx.metrics.inc_split_count();
                        debug!(
                            lineage = %self.lineage,
                            records = self.batch.len(),
                            first = first.len(),
                            second = second.len(),
                            "Batch split"
                        );
                        spawn_stream(
                            Arc::clone(ctx),
                            DispatchStream::new(first, self.lineage.child(0)),
                            token.clone(),
                        );
                        spawn_stream(
                            Arc::clone(ctx),
                            DispatchStream::new(second, self.lineage.child(1)),
                            token.clone(),
                        );
                        return None;
                    }
                    None => {
                        ctx.metrics.inc_policy_violation_count();
                        warn!(
                            lineage = %self.lineage,
                            records = self.batch.len(),
                            attempt = self.attempt,
                            "Split requested on a batch that cannot be split, dropping it"
                        );
                        return Some(TerminalOutcome::Failed(FailureReason::Unsplittable));
                    }
                },
            }
        }
    }

    #[instrument(
        name = "dispatch_stream",
        skip_all,
        fields(lineage = %self.lineage, records = self.batch.len(), kind = %self.batch.kind())
    )]
    async fn run<Tr, O, C>(
        mut self,
        ctx: Arc<StreamContext<Tr, O, C>>,
        token: CancellationToken,
        _in_flight: InFlightGuard<Tr, O, C>,
    ) where
        Tr: Transport<T> + Sync + 'static,
        O: ObserverSink,
        C: Clock + Sync + 'static,
    {
        let driven = AssertUnwindSafe(self.drive(&ctx, &token))
            .catch_unwind()
            .await;

        let outcome = match driven {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(
                    lineage = %self.lineage,
                    attempt = self.attempt,
                    panic = %message,
                    "Dispatch stream panicked"
                );
                Some(TerminalOutcome::Failed(FailureReason::Aborted(message)))
            }
        };

        if let Some(outcome) = outcome {
            let reported =
                std::panic::catch_unwind(AssertUnwindSafe(|| self.report(&ctx, outcome)));
            if let Err(panic) = reported {
                error!(
                    lineage = %self.lineage,
                    panic = %panic_message(panic.as_ref()),
                    "Observer panicked while reporting"
                );
            }
        }
    }

    fn report<Tr, O, C>(&self, ctx: &StreamContext<Tr, O, C>, outcome: TerminalOutcome)
    where
        O: ObserverSink,
    {
        match &outcome {
            TerminalOutcome::Delivered => {
                ctx.metrics.inc_delivered_count();
                debug!(lineage = %self.lineage, attempts = self.attempt, "Batch delivered");
            }
            TerminalOutcome::Failed(reason) => {
                ctx.metrics.inc_failed_count();
                debug!(
                    lineage = %self.lineage,
                    attempts = self.attempt,
                    reason = %reason,
                    "Batch permanently failed"
                );
            }
            TerminalOutcome::Cancelled => {
                ctx.metrics.inc_cancelled_count();
                debug!(
                    lineage = %self.lineage,
                    attempts = self.attempt,
                    pending_delay_ms = self.next_delay.map(|d| d.as_millis() as u64),
                    "Dispatch cancelled"
                );
            }
        }

        ctx.observer.on_terminal_outcome(DeliveryReport {
            lineage: self.lineage.clone(),
            kind: self.batch.kind(),
            records: self.batch.len(),
            attempts: self.attempt,
            outcome,
        });
    }
}

/// Start `stream` on its own task
pub(crate) fn spawn_stream<T, Tr, O, C>(
    ctx: Arc<StreamContext<Tr, O, C>>,
    stream: DispatchStream<T>,
    token: CancellationToken,
) where
    T: Telemetry,
    Tr: Transport<T> + Sync + 'static,
    O: ObserverSink,
    C: Clock + Sync + 'static,
{
    let guard = InFlightGuard::enter(Arc::clone(&ctx));
    let tracker = ctx.tracker.clone();
    tracker.spawn(stream.run(ctx, token, guard));
}

/// Counts one running stream until dropped
///
/// Dropped with the task future, so the count is released on unwind too.
pub(crate) struct InFlightGuard<Tr, O, C> {
    ctx: Arc<StreamContext<Tr, O, C>>,
}

impl<Tr, O, C> InFlightGuard<Tr, O, C> {
    fn enter(ctx: Arc<StreamContext<Tr, O, C>>) -> Self {
        ctx.metrics.stream_started();
        Self { ctx }
    }
}

impl<Tr, O, C> Drop for InFlightGuard<Tr, O, C> {
    fn drop(&mut self) {
        if self.ctx.metrics.stream_finished() == 0 {
            self.ctx.idle.notify_waiters();
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
