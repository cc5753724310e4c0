pub mod config;
pub mod detection;
pub mod input;
pub mod models;
pub mod output;
pub mod persistence;
pub mod scoring;
pub mod service;
pub mod telemetry;

// Re-export commonly used types
pub use models::{AnomalyDecision, EventSequence, LogEvent, StatsSummary, TelemetryRecord};
pub use detection::{normalize, tokenize_event, tokenize_sequence, AnomalyScorer};
pub use scoring::{ModelArtifact, ModelHandle, ScoringAdapter, ScoringError};
pub use persistence::{PersistenceError, SqliteTelemetryStore, TelemetryStore};
pub use telemetry::{StatsAggregator, TelemetryRecorder};
pub use service::{AnomalyService, PredictOutcome, REFUSAL_MESSAGE};
