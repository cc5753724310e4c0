//! Threshold decision over a tokenized event sequence

use crate::detection::tokenizer::tokenize_sequence;
use crate::models::{AnomalyDecision, EventSequence};
use crate::scoring::{ScoringAdapter, ScoringError};

/// Applies the adapter's threshold to the score of a whole sequence
pub struct AnomalyScorer<'a> {
    adapter: &'a dyn ScoringAdapter,
}

impl<'a> AnomalyScorer<'a> {
    pub fn new(adapter: &'a dyn ScoringAdapter) -> Self {
        AnomalyScorer { adapter }
    }

    /// Score a validated sequence; `score <= threshold` is anomalous
    pub fn score(&self, sequence: &EventSequence) -> Result<AnomalyDecision, ScoringError> {
        let block = tokenize_sequence(sequence);
        let score = self.adapter.score(&block)?;
        let threshold = self.adapter.threshold();

        Ok(AnomalyDecision {
            score,
            is_anomaly: score <= threshold,
            threshold,
            num_events: sequence.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogEvent;
    use std::sync::Mutex;

    /// Scores by counting lines and remembers the last block it saw
    struct LineCountAdapter {
        threshold: f64,
        seen: Mutex<Option<String>>,
    }

    impl LineCountAdapter {
        fn new(threshold: f64) -> Self {
            LineCountAdapter {
                threshold,
                seen: Mutex::new(None),
            }
        }
    }

    impl ScoringAdapter for LineCountAdapter {
        fn score(&self, text: &str) -> Result<f64, ScoringError> {
            *self.seen.lock().unwrap() = Some(text.to_string());
            Ok(text.lines().count() as f64)
        }

        fn threshold(&self) -> f64 {
            self.threshold
        }
    }

    struct FailingAdapter;

    impl ScoringAdapter for FailingAdapter {
        fn score(&self, _text: &str) -> Result<f64, ScoringError> {
            Err(ScoringError::Unexpected("boom".to_string()))
        }

        fn threshold(&self) -> f64 {
            0.0
        }
    }

    fn sequence(n: usize) -> EventSequence {
        EventSequence::new(
            (0..n)
                .map(|i| LogEvent::with_source(format!("event {}", i), "svc", "INFO"))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_num_events_matches_input() {
        let adapter = LineCountAdapter::new(0.0);
        for n in [1, 2, 7] {
            let decision = AnomalyScorer::new(&adapter).score(&sequence(n)).unwrap();
            assert_eq!(decision.num_events, n);
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let adapter = LineCountAdapter::new(2.0);
        let scorer = AnomalyScorer::new(&adapter);

        let at = scorer.score(&sequence(2)).unwrap();
        assert_eq!(at.score, 2.0);
        assert!(at.is_anomaly);

        let above = scorer.score(&sequence(3)).unwrap();
        assert!(!above.is_anomaly);
        assert_eq!(above.threshold, 2.0);
    }

    #[test]
    fn test_adapter_receives_joined_tokens() {
        let adapter = LineCountAdapter::new(0.0);
        AnomalyScorer::new(&adapter).score(&sequence(2)).unwrap();
        let seen = adapter.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen, "svc:info event <num>\nsvc:info event <num>");
    }

    #[test]
    fn test_adapter_error_propagates() {
        let result = AnomalyScorer::new(&FailingAdapter).score(&sequence(1));
        assert!(matches!(result, Err(ScoringError::Unexpected(_))));
    }
}
