//! Pretrained model artifact
//!
//! An artifact is a JSON bundle with three required fields: a bag-of-terms
//! `vectorizer`, an outlier `model`, and the decision `threshold`. The crate
//! only consumes artifacts; producing them is the training pipeline's job.
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "vectorizer": { "vocabulary": { "dfs.datanode:info": 0, "<blk>": 1 }, "norm": "l2" },
//!   "model": { "kind": "linear", "coefficients": [0.4, 0.2], "intercept": -0.1 },
//!   "threshold": 0.0
//! }
//! ```

use super::{ScoringAdapter, ScoringError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Artifact layout version this build understands
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Errors raised while loading an artifact
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Artifact file not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported artifact format version {0}")]
    UnsupportedVersion(u32),

    #[error("Inconsistent artifact: {0}")]
    Invalid(String),
}

impl From<ArtifactError> for ScoringError {
    fn from(err: ArtifactError) -> Self {
        ScoringError::ModelUnavailable(err.to_string())
    }
}

/// Vector normalization applied after weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VectorNorm {
    #[default]
    L2,
    None,
}

/// Bag-of-terms vectorizer
///
/// Terms are the whitespace-separated words of the text block. Terms missing
/// from the vocabulary are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vectorizer {
    pub vocabulary: HashMap<String, usize>,
    /// Per-column inverse document frequency; raw counts when absent
    #[serde(default)]
    pub idf: Option<Vec<f64>>,
    /// Use `1 + ln(count)` instead of the raw count
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default)]
    pub norm: VectorNorm,
}

impl Vectorizer {
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut vector: Vec<f64> = vec![0.0; self.dimension()];

        for term in text.split_whitespace() {
            if let Some(slot) = self
                .vocabulary
                .get(term)
                .and_then(|&column| vector.get_mut(column))
            {
                *slot += 1.0;
            }
        }

        if self.sublinear_tf {
            for value in vector.iter_mut().filter(|v| **v > 0.0) {
                *value = 1.0 + value.ln();
            }
        }

        if let Some(ref idf) = self.idf {
            for (value, weight) in vector.iter_mut().zip(idf) {
                *value *= weight;
            }
        }

        if self.norm == VectorNorm::L2 {
            let length = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
            if length > 0.0 {
                for value in vector.iter_mut() {
                    *value /= length;
                }
            }
        }

        vector
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        let dimension = self.dimension();
        if let Some(column) = self.vocabulary.values().find(|&&c| c >= dimension) {
            return Err(ArtifactError::Invalid(format!(
                "vocabulary column {} out of range for {} terms",
                column, dimension
            )));
        }
        let mut seen = vec![false; dimension];
        for &column in self.vocabulary.values() {
            if std::mem::replace(&mut seen[column], true) {
                return Err(ArtifactError::Invalid(format!(
                    "vocabulary column {} assigned twice",
                    column
                )));
            }
        }
        if let Some(ref idf) = self.idf {
            if idf.len() != dimension {
                return Err(ArtifactError::Invalid(format!(
                    "idf has {} weights for {} terms",
                    idf.len(),
                    dimension
                )));
            }
        }
        Ok(())
    }
}

/// Pretrained outlier model; lower scores are more anomalous
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutlierModel {
    /// `intercept + coefficients · x`
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// `radius - |x - center|`
    Centroid { center: Vec<f64>, radius: f64 },
}

impl OutlierModel {
    fn dimension(&self) -> usize {
        match self {
            OutlierModel::Linear { coefficients, .. } => coefficients.len(),
            OutlierModel::Centroid { center, .. } => center.len(),
        }
    }

    pub fn decision_function(&self, x: &[f64]) -> f64 {
        match self {
            OutlierModel::Linear {
                coefficients,
                intercept,
            } => intercept + coefficients.iter().zip(x).map(|(w, v)| w * v).sum::<f64>(),
            OutlierModel::Centroid { center, radius } => {
                let distance = center
                    .iter()
                    .zip(x)
                    .map(|(c, v)| (v - c) * (v - c))
                    .sum::<f64>()
                    .sqrt();
                radius - distance
            }
        }
    }
}

/// A loaded, validated model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub vectorizer: Vectorizer,
    pub model: OutlierModel,
    pub threshold: f64,
}

impl ModelArtifact {
    /// Read and validate an artifact file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ArtifactError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let artifact = Self::from_json(&contents)?;

        log::info!(
            "Loaded model artifact {} ({} terms, threshold {})",
            path.display(),
            artifact.vectorizer.dimension(),
            artifact.threshold
        );
        Ok(artifact)
    }

    pub fn from_json(contents: &str) -> Result<Self, ArtifactError> {
        let artifact: ModelArtifact = serde_json::from_str(contents)?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion(self.format_version));
        }
        if !self.threshold.is_finite() {
            return Err(ArtifactError::Invalid("threshold is not finite".to_string()));
        }
        self.vectorizer.validate()?;
        if self.model.dimension() != self.vectorizer.dimension() {
            return Err(ArtifactError::Invalid(format!(
                "model expects {} features, vectorizer produces {}",
                self.model.dimension(),
                self.vectorizer.dimension()
            )));
        }
        Ok(())
    }
}

impl ScoringAdapter for ModelArtifact {
    fn score(&self, text: &str) -> Result<f64, ScoringError> {
        let features = self.vectorizer.transform(text);
        let score = self.model.decision_function(&features);
        if !score.is_finite() {
            return Err(ScoringError::Unexpected(format!(
                "model produced non-finite score {}",
                score
            )));
        }
        Ok(score)
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}
