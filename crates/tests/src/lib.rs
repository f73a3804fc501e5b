//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract snapshots (wire shape of records)
//! - Config -> transport -> dispatcher -> observer runs without a network

#[cfg(test)]
mod contract_tests {
    use contracts::{Attributes, Log, Metric, TelemetryBatch};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_metric_wire_shape() {
        let metric = Metric::Gauge {
            name: "cpu".to_string(),
            value: 0.5,
            timestamp_ms: 1_700_000_000_000,
            attributes: Attributes::new().put("host", "a"),
        };

        assert_eq!(
            serde_json::to_string(&metric).unwrap(),
            r#"{"type":"gauge","name":"cpu","value":0.5,"timestamp_ms":1700000000000,"attributes":{"host":"a"}}"#
        );
    }

    #[test]
    fn test_log_defaults_on_decode() {
        let log: Log =
            serde_json::from_str(r#"{"timestamp_ms":1,"message":"hello"}"#).unwrap();
        assert!(log.attributes.is_empty());
        assert!(log.level.is_none());
    }

    #[test]
    fn test_split_halves_share_common_attributes() {
        let batch = TelemetryBatch::new(
            (1..=5)
                .map(|i| Metric::Count {
                    name: format!("c{i}"),
                    value: 1.0,
                    start_ms: 0,
                    end_ms: 1,
                    attributes: Attributes::new(),
                })
                .collect(),
            Attributes::new().put("service.name", "svc"),
        );

        let (first, second) = batch.split().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 3);
        assert_eq!(first.common_attributes(), batch.common_attributes());
        assert_eq!(second.records()[0].name(), "c3");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Attributes, SendOutcome, Span, SpanBatch, TelemetryBatch, TerminalOutcome};
    use dispatcher::mock::{CollectingObserver, ScriptedTransport};
    use dispatcher::{create_transport, BatchDispatcherBuilder, DispatcherError, RetryPolicy};
    use observability::MetricsObserver;

    fn spans(n: usize) -> SpanBatch {
        TelemetryBatch::new(
            (0..n)
                .map(|i| Span {
                    id: format!("span-{i}"),
                    trace_id: "trace-1".to_string(),
                    name: "db.query".to_string(),
                    parent_id: None,
                    service_name: Some("checkout".to_string()),
                    timestamp_ms: i as u64,
                    duration_ms: 1.5,
                    attributes: Attributes::new(),
                })
                .collect(),
            Attributes::new().put("service.name", "checkout"),
        )
    }

    fn load(toml: &str) -> contracts::SenderConfig {
        ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap()
    }

    /// Config -> SimulatedTransport -> BatchDispatcher -> MetricsObserver
    ///
    /// Every batch is larger than the transport accepts, so each one is split
    /// until the pieces fit and every record is still delivered exactly once.
    #[tokio::test]
    async fn test_e2e_oversized_batches_are_split_and_delivered() {
        let config = load(
            r#"
service_name = "checkout"

[retry]
base_delay_ms = 1
max_delay_ms = 10
jitter_ratio = 0.0

[transport]
name = "sim"
transport_type = "simulated"
[transport.params]
max_batch_records = "8"
"#,
        );

        let transport = create_transport(&config.transport).unwrap();
        let observer = Arc::new(MetricsObserver::new());
        let dispatcher = BatchDispatcherBuilder::new(transport, Arc::clone(&observer))
            .policy(RetryPolicy::from_config(&config.retry))
            .build();

        for _ in 0..5 {
            dispatcher.dispatch(spans(50)).unwrap();
        }
        dispatcher.wait_idle().await;

        let summary = observer.summary();
        assert_eq!(summary.records.delivered, 250);
        assert_eq!(summary.failed_streams, 0);
        // 50 -> 25 -> 12/13 -> 6/6/6/7 : eight leaves per batch
        assert_eq!(summary.delivered_streams, 40);
        assert!((summary.split_depth.mean - 3.0).abs() < 1e-10);

        let metrics = dispatcher.metrics().snapshot();
        assert_eq!(metrics.split_count, 5 * 7);
        assert_eq!(metrics.in_flight, 0);
    }

    /// Leaves of a split lineage partition the original records
    #[tokio::test]
    async fn test_e2e_split_leaves_partition_records() {
        let transport = Arc::new(ScriptedTransport::from_fn(|batch: &SpanBatch| {
            if batch.len() > 3 {
                SendOutcome::SplitRequested
            } else {
                SendOutcome::Success
            }
        }));
        let observer = Arc::new(CollectingObserver::new());
        let dispatcher = BatchDispatcherBuilder::new(Arc::clone(&transport), Arc::clone(&observer))
            .build();

        let original = spans(11);
        let root = dispatcher.dispatch(original.clone()).unwrap();
        dispatcher.wait_idle().await;

        let leaves: Vec<SpanBatch> = transport
            .sent()
            .into_iter()
            .filter(|b| b.len() <= 3)
            .collect();

        let mut ids: Vec<&str> = leaves
            .iter()
            .flat_map(|b| b.records().iter().map(|s| s.id.as_str()))
            .collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len(), "a record was delivered twice");

        ids.sort_unstable();
        let mut expected: Vec<&str> = original.records().iter().map(|s| s.id.as_str()).collect();
        expected.sort_unstable();
        assert_eq!(ids, expected);

        let reports = observer.reports();
        assert_eq!(reports.len(), leaves.len());
        assert!(reports.iter().all(|r| r.lineage.descends_from(root.lineage())));
        assert!(reports.iter().all(|r| r.outcome == TerminalOutcome::Delivered));
    }

    /// Transient pushback followed by success, observed through MetricsObserver
    #[tokio::test]
    async fn test_e2e_transient_failures_recover() {
        let transport = ScriptedTransport::scripted(vec![
            SendOutcome::BackoffRequested,
            SendOutcome::RequestedWait(Duration::from_millis(5)),
            SendOutcome::BackoffRequested,
            SendOutcome::Success,
        ]);
        let observer = Arc::new(MetricsObserver::new());
        let dispatcher = BatchDispatcherBuilder::new(transport, Arc::clone(&observer))
            .policy(RetryPolicy::new(
                Duration::from_millis(1),
                Duration::from_millis(4),
                dispatcher::Jitter::None,
            ))
            .build();

        dispatcher.dispatch(spans(3)).unwrap();
        dispatcher.wait_idle().await;

        let summary = observer.summary();
        assert_eq!(summary.delivered_streams, 1);
        assert!((summary.attempts.mean - 4.0).abs() < 1e-10);

        let metrics = dispatcher.metrics().snapshot();
        assert_eq!(metrics.backoff_count, 2);
        assert_eq!(metrics.requested_wait_count, 1);
        assert_eq!(metrics.send_count, 4);
    }

    /// Shutdown cancels streams stuck in long backoff and refuses new work
    #[tokio::test]
    async fn test_e2e_shutdown_under_pushback() {
        let config = load(
            r#"
service_name = "checkout"

[retry]
base_delay_ms = 60000
max_delay_ms = 60000

[shutdown]
timeout_ms = 50

[transport]
transport_type = "simulated"
[transport.params]
backoff_rate = "1.0"
"#,
        );

        let transport = create_transport(&config.transport).unwrap();
        let observer = Arc::new(MetricsObserver::new());
        let dispatcher = BatchDispatcherBuilder::new(transport, Arc::clone(&observer))
            .policy(RetryPolicy::from_config(&config.retry))
            .build();

        for _ in 0..3 {
            dispatcher.dispatch(spans(2)).unwrap();
        }

        let report = dispatcher.shutdown(config.shutdown.timeout()).await;
        assert!(!report.drained);
        assert_eq!(report.metrics.cancelled_count, 3);
        assert_eq!(observer.summary().cancelled_streams, 3);

        assert!(matches!(
            dispatcher.dispatch(spans(1)),
            Err(DispatcherError::ShuttingDown)
        ));
    }

    /// Permanent rejection is reported once and never retried
    #[tokio::test]
    async fn test_e2e_permanent_rejection() {
        let config = load(
            r#"
service_name = "checkout"
[transport]
transport_type = "simulated"
[transport.params]
reject_rate = "1.0"
"#,
        );

        let transport = create_transport(&config.transport).unwrap();
        let observer = Arc::new(MetricsObserver::new());
        let dispatcher = BatchDispatcherBuilder::new(transport, Arc::clone(&observer))
            .policy(RetryPolicy::from_config(&config.retry))
            .build();

        dispatcher.dispatch(spans(4)).unwrap();
        dispatcher.wait_idle().await;

        let summary = observer.summary();
        assert_eq!(summary.failed_streams, 1);
        assert_eq!(summary.records.failed, 4);
        assert_eq!(summary.failure_reasons.get("rejected"), Some(&1));
        assert_eq!(dispatcher.metrics().send_count(), 1);
    }
}
