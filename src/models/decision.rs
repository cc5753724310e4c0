use serde::{Deserialize, Serialize};

/// Outcome of scoring one event sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDecision {
    pub score: f64,
    pub is_anomaly: bool,
    /// Threshold of the loaded model artifact
    pub threshold: f64,
    pub num_events: usize,
}
