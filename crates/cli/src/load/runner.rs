//! Load runner - wires config, transport, dispatcher and observer together.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{Log, Metric, SenderConfig, Span, TelemetryKind};
use dispatcher::{create_transport, BatchDispatcherBuilder, ConfiguredTransport, RetryPolicy};
use observability::{record_dispatch_snapshot, MetricsObserver};
use tracing::{info, instrument, warn};

use super::{BatchGenerator, RunStats, Synthetic};
use crate::error::{CliError, Result};

const METRICS_INTERVAL: Duration = Duration::from_secs(1);

/// Settings for one load run
#[derive(Debug, Clone)]
pub struct LoadRunConfig {
    /// Validated sender configuration, CLI overrides already applied
    pub config: SenderConfig,

    /// Give up waiting for delivery after this long (None = wait forever)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Dispatches the configured synthetic load and waits for every outcome
pub struct LoadRunner {
    config: LoadRunConfig,
}

impl LoadRunner {
    pub fn new(config: LoadRunConfig) -> Self {
        Self { config }
    }

    /// Run to completion, or until `interrupt` resolves
    pub async fn run<F>(self, interrupt: F) -> Result<RunStats>
    where
        F: Future<Output = ()>,
    {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port).map_err(|e| CliError::metrics(e.to_string()))?;
            info!("Metrics endpoint available on port {}", port);
        }

        let transport = create_transport(&self.config.config.transport)?;
        info!(
            transport = %transport.name(),
            transport_type = ?transport.transport_type(),
            "Transport created"
        );

        match self.config.config.load.record_kind {
            TelemetryKind::Metric => self.drive::<Metric, F>(transport, interrupt).await,
            TelemetryKind::Log => self.drive::<Log, F>(transport, interrupt).await,
            TelemetryKind::Span => self.drive::<Span, F>(transport, interrupt).await,
        }
    }

    #[instrument(
        name = "load_run",
        skip_all,
        fields(kind = %T::kind(), batches = self.config.config.load.batches)
    )]
    async fn drive<T, F>(&self, transport: ConfiguredTransport, interrupt: F) -> Result<RunStats>
    where
        T: Synthetic,
        F: Future<Output = ()>,
    {
        let sender = &self.config.config;
        let start = Instant::now();

        let observer = Arc::new(MetricsObserver::new());
        let dispatcher = BatchDispatcherBuilder::new(transport, Arc::clone(&observer))
            .policy(RetryPolicy::from_config(&sender.retry))
            .build::<T>();

        let exporter = self.config.metrics_port.map(|_| {
            let metrics = Arc::clone(dispatcher.metrics());
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(METRICS_INTERVAL);
                loop {
                    ticker.tick().await;
                    record_dispatch_snapshot(&metrics.snapshot());
                }
            })
        });

        let mut generator = BatchGenerator::new(&sender.service_name, sender.load.records_per_batch);
        for _ in 0..sender.load.batches {
            dispatcher.dispatch(generator.next_batch::<T>())?;
        }
        info!(
            batches = sender.load.batches,
            records = generator.generated(),
            "All batches dispatched"
        );

        let settle = async {
            match self.config.timeout {
                Some(limit) => tokio::time::timeout(limit, dispatcher.wait_idle())
                    .await
                    .is_ok(),
                None => {
                    dispatcher.wait_idle().await;
                    true
                }
            }
        };

        let (settled, interrupted) = tokio::select! {
            settled = settle => (settled, false),
            _ = interrupt => {
                warn!("Received shutdown signal, stopping dispatch...");
                (false, true)
            }
        };

        if !settled && !interrupted {
            warn!(
                in_flight = dispatcher.metrics().in_flight(),
                "Timed out waiting for delivery"
            );
        }

        let report = dispatcher.shutdown(sender.shutdown.timeout()).await;

        if let Some(handle) = exporter {
            handle.abort();
        }
        record_dispatch_snapshot(&report.metrics);

        Ok(RunStats {
            kind: T::kind(),
            batches: sender.load.batches,
            records: generator.generated(),
            duration: start.elapsed(),
            interrupted,
            timed_out: !settled && !interrupted,
            drained: report.drained,
            dispatch: report.metrics,
            delivery: observer.summary(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{LoadConfig, RetryConfig, ShutdownConfig, TransportConfig, TransportType};
    use std::collections::HashMap;

    fn sender(transport_type: TransportType, params: &[(&str, &str)]) -> SenderConfig {
        SenderConfig {
            version: Default::default(),
            service_name: "load-test".to_string(),
            retry: RetryConfig {
                base_delay_ms: 1,
                max_delay_ms: 5,
                jitter_ratio: 0.0,
            },
            shutdown: ShutdownConfig { timeout_ms: 200 },
            transport: TransportConfig {
                name: "under-test".to_string(),
                transport_type,
                params: params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<HashMap<_, _>>(),
            },
            load: LoadConfig {
                batches: 4,
                records_per_batch: 10,
                record_kind: TelemetryKind::Span,
            },
        }
    }

    fn runner(config: SenderConfig) -> LoadRunner {
        LoadRunner::new(LoadRunConfig {
            config,
            timeout: Some(Duration::from_secs(10)),
            metrics_port: None,
        })
    }

    #[tokio::test]
    async fn test_log_transport_delivers_everything() {
        let stats = runner(sender(TransportType::Log, &[]))
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.kind, TelemetryKind::Span);
        assert_eq!(stats.records, 40);
        assert_eq!(stats.delivery.delivered_streams, 4);
        assert_eq!(stats.delivery.records.delivered, 40);
        assert!(stats.drained);
        assert!(!stats.interrupted);
    }

    #[tokio::test]
    async fn test_simulated_splits_oversized_batches() {
        let stats = runner(sender(TransportType::Simulated, &[("max_batch_records", "3")]))
            .run(std::future::pending())
            .await
            .unwrap();

        // 10 -> 5 + 5 -> (2 + 3) + (2 + 3)
        assert_eq!(stats.dispatch.split_count, 4 * 3);
        assert_eq!(stats.delivery.records.delivered, 40);
        assert_eq!(stats.delivery.failed_streams, 0);
    }

    #[tokio::test]
    async fn test_simulated_rejections_are_reported() {
        let stats = runner(sender(TransportType::Simulated, &[("reject_rate", "1.0")]))
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.delivery.failed_streams, 4);
        assert_eq!(stats.delivery.records.failed, 40);
        assert_eq!(stats.dispatch.send_count, 4);
    }

    #[tokio::test]
    async fn test_interrupt_cancels_retrying_streams() {
        let mut config = sender(TransportType::Simulated, &[("backoff_rate", "1.0")]);
        config.retry.base_delay_ms = 60_000;
        config.retry.max_delay_ms = 60_000;

        let stats = runner(config)
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();

        assert!(stats.interrupted);
        assert!(!stats.drained);
        assert_eq!(stats.delivery.cancelled_streams, 4);
    }

    #[tokio::test]
    async fn test_bad_transport_params_fail_fast() {
        let err = runner(sender(TransportType::Simulated, &[("reject_rate", "7")]))
            .run(std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Dispatch(_)));
    }
}
