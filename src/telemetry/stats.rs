//! Summary statistics over stored telemetry
//!
//! Summaries are computed from a fresh read on every call and never cached.

use crate::models::{StatsSummary, TelemetryRecord};
use crate::persistence::{PersistenceError, TelemetryStore};
use std::sync::Arc;

/// Reads all telemetry and computes latency/size statistics
pub struct StatsAggregator {
    store: Arc<dyn TelemetryStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        StatsAggregator { store }
    }

    pub fn compute(&self) -> Result<StatsSummary, PersistenceError> {
        let records = self.store.read_all()?;
        Ok(summarize(&records))
    }
}

/// Summarize a snapshot of records
pub fn summarize(records: &[TelemetryRecord]) -> StatsSummary {
    if records.is_empty() {
        return StatsSummary::empty();
    }

    let mut times: Vec<f64> = records.iter().map(|r| r.processing_time).collect();
    times.sort_by(f64::total_cmp);

    let sizes: Vec<f64> = records
        .iter()
        .filter_map(|r| r.input_size)
        .map(|size| size as f64)
        .collect();

    StatsSummary {
        total_requests: records.len(),
        mean_processing_time: mean(&times).unwrap_or(0.0),
        median_processing_time: percentile(&times, 50.0),
        percentile_95_processing_time: percentile(&times, 95.0),
        percentile_99_processing_time: percentile(&times, 99.0),
        average_input_size: mean(&sizes),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Percentile of sorted values, interpolating linearly between the two
/// closest ranks (rank = p/100 * (n - 1)).
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let fraction = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}
