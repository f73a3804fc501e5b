//! Synthetic telemetry batches.

use std::time::{SystemTime, UNIX_EPOCH};

use contracts::{Attributes, Log, Metric, Span, Telemetry, TelemetryBatch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const LEVELS: &[&str] = &["DEBUG", "INFO", "INFO", "INFO", "WARN", "ERROR"];
const OPERATIONS: &[&str] = &["GET /cart", "POST /checkout", "db.query", "cache.get"];

/// Record family the generator knows how to fabricate
pub trait Synthetic: Telemetry + Serialize {
    fn synthesize(generator: &mut BatchGenerator, seq: u64) -> Self;
}

/// Produces batches of fake records for one service
pub struct BatchGenerator {
    service_name: String,
    records_per_batch: usize,
    next_seq: u64,
    rng: StdRng,
}

impl BatchGenerator {
    pub fn new(service_name: impl Into<String>, records_per_batch: usize) -> Self {
        Self {
            service_name: service_name.into(),
            records_per_batch,
            next_seq: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic generator for tests
    #[cfg(test)]
    pub fn seeded(service_name: impl Into<String>, records_per_batch: usize, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(service_name, records_per_batch)
        }
    }

    /// Records generated so far
    pub fn generated(&self) -> u64 {
        self.next_seq
    }

    pub fn next_batch<T: Synthetic>(&mut self) -> TelemetryBatch<T> {
        let records = (0..self.records_per_batch)
            .map(|_| {
                let seq = self.next_seq;
                self.next_seq += 1;
                T::synthesize(self, seq)
            })
            .collect();

        let common = Attributes::new()
            .put("service.name", self.service_name.as_str())
            .put("telemetry.source", "synthetic");

        TelemetryBatch::new(records, common)
    }

    fn hex_id(&mut self, bytes: usize) -> String {
        (0..bytes)
            .map(|_| format!("{:02x}", self.rng.random::<u8>()))
            .collect()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Synthetic for Metric {
    fn synthesize(generator: &mut BatchGenerator, seq: u64) -> Self {
        let now = now_ms();
        let attributes = Attributes::new().put("seq", seq as i64);

        match seq % 3 {
            0 => Metric::Count {
                name: "requests".to_string(),
                value: f64::from(generator.rng.random_range(1..100u32)),
                start_ms: now.saturating_sub(10_000),
                end_ms: now,
                attributes,
            },
            1 => Metric::Gauge {
                name: "memory.used_mb".to_string(),
                value: generator.rng.random_range(128.0..4096.0),
                timestamp_ms: now,
                attributes,
            },
            _ => {
                let count = generator.rng.random_range(1..50u64);
                let min = generator.rng.random_range(1.0..10.0);
                let max = min + generator.rng.random_range(0.0..200.0);
                Metric::Summary {
                    name: "latency_ms".to_string(),
                    count,
                    sum: (min + max) / 2.0 * count as f64,
                    min,
                    max,
                    start_ms: now.saturating_sub(10_000),
                    end_ms: now,
                    attributes,
                }
            }
        }
    }
}

impl Synthetic for Log {
    fn synthesize(generator: &mut BatchGenerator, seq: u64) -> Self {
        let level = LEVELS[generator.rng.random_range(0..LEVELS.len())];
        Log {
            timestamp_ms: now_ms(),
            message: format!("synthetic log line {seq}"),
            attributes: Attributes::new().put("seq", seq as i64),
            service_name: Some(generator.service_name.clone()),
            log_type: Some("application".to_string()),
            level: Some(level.to_string()),
        }
    }
}

impl Synthetic for Span {
    fn synthesize(generator: &mut BatchGenerator, seq: u64) -> Self {
        let name = OPERATIONS[generator.rng.random_range(0..OPERATIONS.len())];
        // every fourth span starts a trace
        let parent_id = (seq % 4 != 0).then(|| generator.hex_id(8));

        Span {
            id: generator.hex_id(8),
            trace_id: generator.hex_id(16),
            name: name.to_string(),
            parent_id,
            service_name: Some(generator.service_name.clone()),
            timestamp_ms: now_ms(),
            duration_ms: generator.rng.random_range(0.1..500.0),
            attributes: Attributes::new().put("seq", seq as i64),
        }
    }
}
