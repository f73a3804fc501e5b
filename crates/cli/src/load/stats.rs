//! Load run statistics.

use std::time::Duration;

use contracts::TelemetryKind;
use dispatcher::MetricsSnapshot;
use observability::DeliverySummary;

/// Statistics from a load run
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Record family that was generated
    pub kind: TelemetryKind,

    /// Batches handed to the dispatcher
    pub batches: usize,

    /// Records handed to the dispatcher
    pub records: u64,

    /// Wall time from first dispatch to shutdown
    pub duration: Duration,

    /// Stopped by Ctrl+C / SIGTERM
    pub interrupted: bool,

    /// Stopped by `--timeout`
    pub timed_out: bool,

    /// Every stream finished within the shutdown grace period
    pub drained: bool,

    /// Dispatcher counters at shutdown
    pub dispatch: MetricsSnapshot,

    /// Terminal outcomes seen by the observer
    pub delivery: DeliverySummary,
}

impl RunStats {
    /// Delivered records per second
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.delivery.records.delivered as f64 / secs
        } else {
            0.0
        }
    }

    /// Retries of any kind
    pub fn retries(&self) -> u64 {
        self.dispatch.backoff_count + self.dispatch.requested_wait_count
    }

    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Load Run Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Kind: {}", self.kind);
        println!("   ├─ Batches: {}", self.batches);
        println!("   ├─ Records: {}", self.records);
        println!("   ├─ Throughput: {:.1} records/s", self.throughput());
        println!(
            "   └─ Stopped by: {}",
            if self.interrupted {
                "signal"
            } else if self.timed_out {
                "timeout"
            } else {
                "completion"
            }
        );

        println!("\nDispatcher");
        println!("   ├─ Send attempts: {}", self.dispatch.send_count);
        println!(
            "   ├─ Retries: {} (backoff {}, requested wait {})",
            self.retries(),
            self.dispatch.backoff_count,
            self.dispatch.requested_wait_count
        );
        println!("   ├─ Splits: {}", self.dispatch.split_count);
        println!(
            "   ├─ Unsplittable batches: {}",
            self.dispatch.policy_violation_count
        );
        println!("   └─ Drained on shutdown: {}", self.drained);

        println!("\n{}", self.delivery);
    }
}
