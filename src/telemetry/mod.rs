//! Request telemetry
//!
//! Every admitted request produces exactly one [`TelemetryRecord`]. An
//! [`Attempt`] is opened at admission and consumed by
//! [`TelemetryRecorder::finish`], so it cannot be recorded twice.

pub mod stats;

pub use stats::StatsAggregator;

use crate::models::{NewTelemetryRecord, RequestKind, TelemetryRecord};
use crate::persistence::{PersistenceError, TelemetryStore};
use std::sync::Arc;
use std::time::Instant;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_MODEL_UNAVAILABLE: u16 = 403;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

pub const BAD_REQUEST_MESSAGE: &str = "bad request";
pub const MODEL_UNAVAILABLE_MESSAGE: &str = "model could not process the data";
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// An admitted request whose outcome has not been recorded yet
#[must_use = "every admitted attempt must be finished exactly once"]
#[derive(Debug)]
pub struct Attempt {
    request_type: RequestKind,
    input_size: Option<i64>,
    started: Instant,
}

impl Attempt {
    pub fn request_type(&self) -> RequestKind {
        self.request_type
    }

    pub fn input_size(&self) -> Option<i64> {
        self.input_size
    }
}

/// How an admitted attempt ended
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Serialized decision
    Success { result: String },
    /// Admitted payload could not be decoded
    BadRequest,
    ModelUnavailable,
    Unexpected,
}

impl AttemptOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            AttemptOutcome::Success { .. } => STATUS_OK,
            AttemptOutcome::BadRequest => STATUS_BAD_REQUEST,
            AttemptOutcome::ModelUnavailable => STATUS_MODEL_UNAVAILABLE,
            AttemptOutcome::Unexpected => STATUS_INTERNAL_ERROR,
        }
    }

    fn error_message(&self) -> Option<&'static str> {
        match self {
            AttemptOutcome::Success { .. } => None,
            AttemptOutcome::BadRequest => Some(BAD_REQUEST_MESSAGE),
            AttemptOutcome::ModelUnavailable => Some(MODEL_UNAVAILABLE_MESSAGE),
            AttemptOutcome::Unexpected => Some(INTERNAL_ERROR_MESSAGE),
        }
    }
}

/// Appends one telemetry record per admitted attempt
#[derive(Clone)]
pub struct TelemetryRecorder {
    store: Arc<dyn TelemetryStore>,
}

impl TelemetryRecorder {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        TelemetryRecorder { store }
    }

    pub fn store(&self) -> &Arc<dyn TelemetryStore> {
        &self.store
    }

    /// Admit a request and start its clock
    pub fn begin(&self, request_type: RequestKind, input_size: Option<i64>) -> Attempt {
        Attempt {
            request_type,
            input_size,
            started: Instant::now(),
        }
    }

    /// Record the outcome of an attempt
    ///
    /// Storage failures are returned to the caller and must not be masked.
    pub fn finish(
        &self,
        attempt: Attempt,
        outcome: AttemptOutcome,
    ) -> Result<TelemetryRecord, PersistenceError> {
        let processing_time = attempt.started.elapsed().as_secs_f64();
        let status_code = outcome.status_code();
        let error_message = outcome.error_message().map(str::to_string);
        let result = match outcome {
            AttemptOutcome::Success { result } => Some(result),
            _ => None,
        };

        let record = self.store.append(&NewTelemetryRecord {
            request_type: attempt.request_type,
            processing_time,
            input_size: attempt.input_size,
            status_code,
            result,
            error_message,
        })?;

        log::debug!(
            "Recorded {} request #{} (status {}, {:.6}s)",
            record.request_type,
            record.id,
            record.status_code,
            record.processing_time
        );
        Ok(record)
    }
}
