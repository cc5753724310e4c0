//! Outlier scoring backed by a pretrained model artifact
//!
//! The artifact is loaded at most once per process through a [`ModelHandle`]
//! and shared read-only by every in-flight request afterwards.

pub mod artifact;

pub use artifact::{ArtifactError, ModelArtifact, OutlierModel, Vectorizer, VectorNorm};

use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while scoring a text block
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Unexpected scoring failure: {0}")]
    Unexpected(String),
}

/// Opaque text-to-score function with its decision threshold
///
/// Lower scores indicate greater abnormality; a score at or below
/// `threshold()` is anomalous.
pub trait ScoringAdapter: Send + Sync {
    fn score(&self, text: &str) -> Result<f64, ScoringError>;

    fn threshold(&self) -> f64;
}

/// Process-wide holder of the scoring adapter
///
/// The artifact is read on the first call to [`ModelHandle::get`] (or
/// [`ModelHandle::preload`]). Concurrent first callers block until the single
/// load finishes. A failed load is remembered too: the artifact is never
/// re-read and every later call reports the model as unavailable.
pub struct ModelHandle {
    artifact_path: PathBuf,
    cell: OnceCell<Result<Arc<dyn ScoringAdapter>, String>>,
}

impl ModelHandle {
    pub fn new<P: AsRef<Path>>(artifact_path: P) -> Self {
        ModelHandle {
            artifact_path: artifact_path.as_ref().to_path_buf(),
            cell: OnceCell::new(),
        }
    }

    /// Handle around an adapter that is already loaded
    pub fn from_adapter(adapter: Arc<dyn ScoringAdapter>) -> Self {
        ModelHandle {
            artifact_path: PathBuf::new(),
            cell: OnceCell::with_value(Ok(adapter)),
        }
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Load eagerly, typically at startup
    pub fn preload(&self) -> Result<(), ScoringError> {
        self.get().map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }

    pub fn get(&self) -> Result<Arc<dyn ScoringAdapter>, ScoringError> {
        let loaded = self.cell.get_or_init(|| {
            ModelArtifact::load(&self.artifact_path)
                .map(|artifact| Arc::new(artifact) as Arc<dyn ScoringAdapter>)
                .map_err(|e| {
                    log::error!(
                        "Failed to load model artifact {}: {}",
                        self.artifact_path.display(),
                        e
                    );
                    e.to_string()
                })
        });

        match loaded {
            Ok(adapter) => Ok(Arc::clone(adapter)),
            Err(reason) => Err(ScoringError::ModelUnavailable(reason.clone())),
        }
    }
}
