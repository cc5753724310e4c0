//! Predict operation and the telemetry surface
//!
//! [`AnomalyService`] is what an outer layer (HTTP handler, CLI) calls into.
//! Rejected input is answered before admission and leaves no telemetry.
//! Every admitted attempt is scored off the async executor and recorded
//! exactly once, whatever its outcome.

use crate::detection::AnomalyScorer;
use crate::input::decode_payload;
use crate::models::{
    AnomalyDecision, EventSequence, LogEvent, RequestKind, StatsSummary, TelemetryRecord,
    ValidationError,
};
use crate::persistence::{PersistenceError, TelemetryStore};
use crate::scoring::{ModelHandle, ScoringError};
use crate::telemetry::{
    Attempt, AttemptOutcome, StatsAggregator, TelemetryRecorder, MODEL_UNAVAILABLE_MESSAGE,
};
use std::sync::Arc;

/// The single message callers see when scoring is refused
pub const REFUSAL_MESSAGE: &str = MODEL_UNAVAILABLE_MESSAGE;

/// Result of a predict call
#[derive(Debug, Clone, PartialEq)]
pub enum PredictOutcome {
    Success(AnomalyDecision),
    /// Input was empty or malformed
    Rejected(ValidationError),
    /// The model was unavailable or scoring failed; details stay internal
    Refused,
}

impl PredictOutcome {
    pub fn decision(&self) -> Option<&AnomalyDecision> {
        match self {
            PredictOutcome::Success(decision) => Some(decision),
            _ => None,
        }
    }
}

/// Scores event sequences and exposes the accumulated telemetry
pub struct AnomalyService {
    model: Arc<ModelHandle>,
    recorder: TelemetryRecorder,
    stats: StatsAggregator,
}

impl AnomalyService {
    pub fn new(model: Arc<ModelHandle>, store: Arc<dyn TelemetryStore>) -> Self {
        AnomalyService {
            model,
            recorder: TelemetryRecorder::new(Arc::clone(&store)),
            stats: StatsAggregator::new(store),
        }
    }

    pub fn model(&self) -> &Arc<ModelHandle> {
        &self.model
    }

    /// Score a structured event sequence
    ///
    /// The only error is a telemetry storage failure.
    pub async fn predict(&self, events: Vec<LogEvent>) -> Result<PredictOutcome, PersistenceError> {
        let sequence = match EventSequence::new(events) {
            Ok(sequence) => sequence,
            Err(e) => {
                log::debug!("Rejected event sequence: {}", e);
                return Ok(PredictOutcome::Rejected(e));
            }
        };

        let attempt = self
            .recorder
            .begin(RequestKind::Logs, Some(sequence.len() as i64));
        self.score_admitted(attempt, sequence).await
    }

    /// Score a raw JSON payload
    ///
    /// A payload that is not valid JSON of the expected shape is admitted and
    /// recorded as a bad request. A well-formed payload holding an empty
    /// sequence or an empty message is rejected like a structured one.
    pub async fn predict_payload(&self, payload: &str) -> Result<PredictOutcome, PersistenceError> {
        let input_size = Some(payload.len() as i64);

        let events = match decode_payload(payload) {
            Ok(events) => events,
            Err(e) => {
                log::debug!("Malformed JSON payload: {}", e);
                let attempt = self.recorder.begin(RequestKind::Json, input_size);
                self.recorder.finish(attempt, AttemptOutcome::BadRequest)?;
                return Ok(PredictOutcome::Rejected(e));
            }
        };

        let sequence = match EventSequence::new(events) {
            Ok(sequence) => sequence,
            Err(e) => {
                log::debug!("Rejected event sequence: {}", e);
                return Ok(PredictOutcome::Rejected(e));
            }
        };

        let attempt = self.recorder.begin(RequestKind::Json, input_size);
        self.score_admitted(attempt, sequence).await
    }

    /// Score and record on a detached task, so the attempt is recorded even
    /// when the caller stops waiting.
    async fn score_admitted(
        &self,
        attempt: Attempt,
        sequence: EventSequence,
    ) -> Result<PredictOutcome, PersistenceError> {
        let model = Arc::clone(&self.model);
        let recorder = self.recorder.clone();

        match tokio::spawn(score_and_record(model, recorder, attempt, sequence)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Scoring task did not complete: {}", e);
                Ok(PredictOutcome::Refused)
            }
        }
    }

    /// Every telemetry record, newest first
    pub fn history(&self) -> Result<Vec<TelemetryRecord>, PersistenceError> {
        self.recorder.store().read_all()
    }

    /// Fresh summary over all telemetry
    pub fn stats(&self) -> Result<StatsSummary, PersistenceError> {
        self.stats.compute()
    }

    /// Irreversibly delete all telemetry
    pub fn clear_history(&self) -> Result<usize, PersistenceError> {
        let removed = self.recorder.store().clear_all()?;
        log::warn!("Cleared {} telemetry records", removed);
        Ok(removed)
    }
}

async fn score_and_record(
    model: Arc<ModelHandle>,
    recorder: TelemetryRecorder,
    attempt: Attempt,
    sequence: EventSequence,
) -> Result<PredictOutcome, PersistenceError> {
    let scored = tokio::task::spawn_blocking(move || {
        let adapter = model.get()?;
        AnomalyScorer::new(adapter.as_ref()).score(&sequence)
    })
    .await
    .unwrap_or_else(|e| Err(ScoringError::Unexpected(format!("scoring task failed: {}", e))));

    let decision = scored.and_then(|decision| {
        serde_json::to_string(&decision)
            .map(|result| (decision, result))
            .map_err(|e| ScoringError::Unexpected(e.to_string()))
    });

    match decision {
        Ok((decision, result)) => {
            recorder.finish(attempt, AttemptOutcome::Success { result })?;
            if decision.is_anomaly {
                log::info!(
                    "Anomalous sequence of {} events (score {:.4} <= {:.4})",
                    decision.num_events,
                    decision.score,
                    decision.threshold
                );
            }
            Ok(PredictOutcome::Success(decision))
        }
        Err(ScoringError::ModelUnavailable(reason)) => {
            log::warn!("Refusing prediction, model unavailable: {}", reason);
            recorder.finish(attempt, AttemptOutcome::ModelUnavailable)?;
            Ok(PredictOutcome::Refused)
        }
        Err(ScoringError::Unexpected(reason)) => {
            log::error!("Refusing prediction after unexpected failure: {}", reason);
            recorder.finish(attempt, AttemptOutcome::Unexpected)?;
            Ok(PredictOutcome::Refused)
        }
    }
}
