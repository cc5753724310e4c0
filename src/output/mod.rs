use crate::models::{StatsSummary, TelemetryRecord};
use crate::service::{PredictOutcome, REFUSAL_MESSAGE};
use crate::telemetry::BAD_REQUEST_MESSAGE;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Renders predictions and telemetry for the command line
pub struct OutputHandler {
    format: OutputFormat,
    writer: Option<Box<dyn Write + Send>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Console,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "jsonl" => OutputFormat::Jsonl,
            "console" => OutputFormat::Console,
            _ => OutputFormat::Console, // Default
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl OutputHandler {
    /// Create a new output handler; writes to stdout when no file is given
    pub fn new(format: OutputFormat, file_path: Option<PathBuf>) -> Result<Self, OutputError> {
        let writer: Option<Box<dyn Write + Send>> = match file_path {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Box::new(BufWriter::new(file)))
            }
            None => None,
        };

        Ok(OutputHandler { format, writer })
    }

    /// Write the outcome of a predict call
    pub fn write_outcome(&mut self, outcome: &PredictOutcome) -> Result<(), OutputError> {
        match outcome {
            PredictOutcome::Success(decision) => match self.format {
                OutputFormat::Console => self.write_output(&format!(
                    "{} - score: {:.6}, threshold: {:.6}, events: {}\n",
                    if decision.is_anomaly { "ANOMALY" } else { "normal" },
                    decision.score,
                    decision.threshold,
                    decision.num_events
                )),
                _ => self.write_value(decision),
            },
            PredictOutcome::Rejected(e) => match self.format {
                OutputFormat::Console => {
                    self.write_output(&format!("{}: {}\n", BAD_REQUEST_MESSAGE, e))
                }
                _ => self.write_value(&ErrorBody {
                    error: BAD_REQUEST_MESSAGE,
                    detail: Some(e.to_string()),
                }),
            },
            PredictOutcome::Refused => match self.format {
                OutputFormat::Console => self.write_output(&format!("{}\n", REFUSAL_MESSAGE)),
                _ => self.write_value(&ErrorBody {
                    error: REFUSAL_MESSAGE,
                    detail: None,
                }),
            },
        }
    }

    /// Write telemetry records in the order given
    pub fn write_history(&mut self, records: &[TelemetryRecord]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&serde_json::json!({
                    "total": records.len(),
                    "items": records,
                }))?;
                self.write_output(&format!("{}\n", json))
            }
            OutputFormat::Jsonl => {
                for record in records {
                    let json = serde_json::to_string(record)?;
                    self.write_output(&format!("{}\n", json))?;
                }
                Ok(())
            }
            OutputFormat::Console => {
                self.write_output(&format!("{} record(s)\n", records.len()))?;
                for record in records {
                    let output = format!(
                        "#{} [{}] {} status {} in {:.6}s, input {}{}\n",
                        record.id,
                        record.created_at.to_rfc3339(),
                        record.request_type,
                        record.status_code,
                        record.processing_time,
                        record
                            .input_size
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        record
                            .error_message
                            .as_deref()
                            .map(|m| format!(" ({})", m))
                            .unwrap_or_default()
                    );
                    self.write_output(&output)?;
                }
                Ok(())
            }
        }
    }

    /// Write a statistics summary
    pub fn write_stats(&mut self, stats: &StatsSummary) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Console => {
                let output = format!(
                    "total requests: {}\nmean: {:.6}s\nmedian: {:.6}s\np95: {:.6}s\np99: {:.6}s\naverage input size: {}\n",
                    stats.total_requests,
                    stats.mean_processing_time,
                    stats.median_processing_time,
                    stats.percentile_95_processing_time,
                    stats.percentile_99_processing_time,
                    stats
                        .average_input_size
                        .map(|s| format!("{:.2}", s))
                        .unwrap_or_else(|| "-".to_string())
                );
                self.write_output(&output)
            }
            _ => self.write_value(stats),
        }
    }

    /// Write free-form text followed by a newline
    pub fn write_line(&mut self, line: &str) -> Result<(), OutputError> {
        self.write_output(&format!("{}\n", line))
    }

    fn write_value<T: Serialize>(&mut self, value: &T) -> Result<(), OutputError> {
        let json = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            _ => serde_json::to_string(value)?,
        };
        self.write_output(&format!("{}\n", json))
    }

    fn write_output(&mut self, data: &str) -> Result<(), OutputError> {
        match &mut self.writer {
            Some(writer) => {
                writer.write_all(data.as_bytes())?;
                writer.flush()?;
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(data.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    /// Flush any buffered output
    pub fn flush(&mut self) -> Result<(), OutputError> {
        if let Some(writer) = &mut self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnomalyDecision, ValidationError};

    fn write_to_file<F>(format: OutputFormat, write: F) -> String
    where
        F: FnOnce(&mut OutputHandler),
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        {
            let mut handler = OutputHandler::new(format, Some(path.clone())).unwrap();
            write(&mut handler);
            handler.flush().unwrap();
        }
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("jsonl"), OutputFormat::Jsonl);
        assert_eq!(OutputFormat::parse("whatever"), OutputFormat::Console);
    }

    #[test]
    fn test_decision_as_jsonl() {
        let decision = AnomalyDecision {
            score: -0.25,
            is_anomaly: true,
            threshold: 0.0,
            num_events: 2,
        };
        let out = write_to_file(OutputFormat::Jsonl, |h| {
            h.write_outcome(&PredictOutcome::Success(decision.clone())).unwrap()
        });
        let parsed: AnomalyDecision = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(parsed, decision);
    }

    #[test]
    fn test_refusal_has_no_detail() {
        let out = write_to_file(OutputFormat::Jsonl, |h| {
            h.write_outcome(&PredictOutcome::Refused).unwrap()
        });
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["error"], REFUSAL_MESSAGE);
        assert!(value.get("detail").is_none());
    }

    #[test]
    fn test_rejection_on_console() {
        let out = write_to_file(OutputFormat::Console, |h| {
            h.write_outcome(&PredictOutcome::Rejected(ValidationError::EmptySequence))
                .unwrap()
        });
        assert!(out.starts_with("bad request:"));
    }

    #[test]
    fn test_stats_as_json() {
        let out = write_to_file(OutputFormat::Json, |h| {
            h.write_stats(&StatsSummary::empty()).unwrap()
        });
        let parsed: StatsSummary = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, StatsSummary::empty());
    }
}
