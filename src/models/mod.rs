pub mod decision;
pub mod event;
pub mod telemetry;

pub use decision::AnomalyDecision;
pub use event::{EventSequence, LogEvent, ValidationError};
pub use telemetry::{NewTelemetryRecord, RequestKind, StatsSummary, TelemetryRecord};
