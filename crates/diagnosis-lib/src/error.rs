//! Error types for artifact loading and prediction
//!
//! Per-symptom matching misses are never errors; they are returned to the
//! caller as `unmatched_symptoms`. Only structural inconsistencies between the
//! artifacts and the pipeline surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Request-level prediction failures
#[derive(Debug, Error)]
pub enum PredictionError {
    /// The computed features and the artifact schema disagree
    #[error("feature schema mismatch: schema declares {expected} features, builder computed {computed} ({detail})")]
    SchemaMismatch {
        expected: usize,
        computed: usize,
        detail: String,
    },

    /// The classifier selected a class the disease mapping does not know
    #[error("classifier selected class index {0} which has no disease mapping")]
    UnknownClassIndex(usize),

    /// The classifier returned something that is not a valid distribution
    #[error("invalid classifier output: {0}")]
    ClassifierOutput(String),

    #[error("classifier invocation failed")]
    Classifier(#[source] anyhow::Error),
}

/// Failure to apply the fitted scaler. Recovered inside the inference adapter.
#[derive(Debug, Error, PartialEq)]
pub enum ScalingError {
    #[error("scaler fitted on {expected} features, vector has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Load-time failures; a pipeline is never built from invalid artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse metadata {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model checksum mismatch: metadata expects {expected}, file has {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("invalid metadata: {0}")]
    Invalid(String),

    #[error("failed to load classifier")]
    Model(#[source] anyhow::Error),
}

pub type Result<T, E = PredictionError> = std::result::Result<T, E>;
