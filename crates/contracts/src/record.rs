//! Telemetry records - the units carried inside a batch.

use serde::{Deserialize, Serialize};

use crate::Attributes;

/// Record family, used for log fields and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryKind {
    Metric,
    Log,
    Span,
}

impl TelemetryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Log => "log",
            Self::Span => "span",
        }
    }
}

impl std::fmt::Display for TelemetryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can travel in a [`TelemetryBatch`](crate::TelemetryBatch)
pub trait Telemetry: Clone + Send + Sync + 'static {
    /// Record family
    fn kind() -> TelemetryKind;
}

/// Metric record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Metric {
    /// Delta count over an interval
    Count {
        name: String,
        value: f64,
        start_ms: u64,
        end_ms: u64,
        #[serde(default)]
        attributes: Attributes,
    },
    /// Point-in-time value
    Gauge {
        name: String,
        value: f64,
        timestamp_ms: u64,
        #[serde(default)]
        attributes: Attributes,
    },
    /// Pre-aggregated distribution over an interval
    Summary {
        name: String,
        count: u64,
        sum: f64,
        min: f64,
        max: f64,
        start_ms: u64,
        end_ms: u64,
        #[serde(default)]
        attributes: Attributes,
    },
}

impl Metric {
    pub fn name(&self) -> &str {
        match self {
            Self::Count { name, .. } | Self::Gauge { name, .. } | Self::Summary { name, .. } => {
                name
            }
        }
    }
}

impl Telemetry for Metric {
    fn kind() -> TelemetryKind {
        TelemetryKind::Metric
    }
}

/// Single log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    /// Creation time (epoch ms)
    pub timestamp_ms: u64,

    /// The log line itself
    pub message: String,

    #[serde(default)]
    pub attributes: Attributes,

    /// Producing service (sent as `service.name`)
    #[serde(default)]
    pub service_name: Option<String>,

    #[serde(default)]
    pub log_type: Option<String>,

    /// Level string, e.g. "INFO"
    #[serde(default)]
    pub level: Option<String>,
}

impl Telemetry for Log {
    fn kind() -> TelemetryKind {
        TelemetryKind::Log
    }
}

/// Single span of a distributed trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub id: String,
    pub trace_id: String,
    pub name: String,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub service_name: Option<String>,

    /// Start time (epoch ms)
    pub timestamp_ms: u64,

    pub duration_ms: f64,

    #[serde(default)]
    pub attributes: Attributes,
}

impl Telemetry for Span {
    fn kind() -> TelemetryKind {
        TelemetryKind::Span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_name() {
        let m = Metric::Gauge {
            name: "cpu.load".to_string(),
            value: 0.5,
            timestamp_ms: 1,
            attributes: Attributes::new(),
        };
        assert_eq!(m.name(), "cpu.load");
        assert_eq!(Metric::kind(), TelemetryKind::Metric);
    }

    #[test]
    fn test_metric_tagged_json() {
        let m = Metric::Count {
            name: "requests".to_string(),
            value: 99.0,
            start_ms: 100,
            end_ms: 200,
            attributes: Attributes::new().put("bar", "baz"),
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["type"], "count");
        assert_eq!(json["attributes"]["bar"], "baz");
    }

    #[test]
    fn test_log_optional_fields_default() {
        let log: Log = serde_json::from_str(r#"{"timestamp_ms": 5, "message": "hi"}"#).unwrap();
        assert_eq!(log.message, "hi");
        assert!(log.level.is_none());
        assert!(log.attributes.is_empty());
    }
}
