use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of request a telemetry record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Structured event sequence; input size is the event count
    Logs,
    /// Raw JSON payload; input size is the payload length in bytes
    Json,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Logs => "logs",
            RequestKind::Json => "json",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logs" => Ok(RequestKind::Logs),
            "json" => Ok(RequestKind::Json),
            other => Err(format!("unknown request type: {}", other)),
        }
    }
}

/// Telemetry row before the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq)]
pub struct NewTelemetryRecord {
    pub request_type: RequestKind,
    pub processing_time: f64,
    pub input_size: Option<i64>,
    pub status_code: u16,
    pub result: Option<String>,
    pub error_message: Option<String>,
}

/// One durable entry describing a single admitted request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub id: i64,
    pub request_type: RequestKind,
    /// Seconds from admission to completion
    pub processing_time: f64,
    pub input_size: Option<i64>,
    pub status_code: u16,
    pub result: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate latency and size statistics over all telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_requests: usize,
    pub mean_processing_time: f64,
    pub median_processing_time: f64,
    pub percentile_95_processing_time: f64,
    pub percentile_99_processing_time: f64,
    pub average_input_size: Option<f64>,
}

impl StatsSummary {
    pub fn empty() -> Self {
        StatsSummary {
            total_requests: 0,
            mean_processing_time: 0.0,
            median_processing_time: 0.0,
            percentile_95_processing_time: 0.0,
            percentile_99_processing_time: 0.0,
            average_input_size: None,
        }
    }
}
