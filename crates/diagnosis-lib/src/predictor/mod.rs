//! Disease prediction engine

mod inference;
mod onnx;
mod output;
mod pipeline;
mod scaler;

pub use inference::{Inference, InferenceAdapter, InferenceStats, MAX_INFERENCE_MS};
pub use onnx::OnnxClassifier;
pub use output::{DiseaseMapping, ResultComposer};
pub use pipeline::DiagnosisPipeline;
pub use scaler::StandardScaler;

use crate::models::Classification;
use anyhow::Result;

/// Trained classifier loaded from an opaque artifact.
///
/// Implementations must hold no per-call mutable state: the pipeline calls
/// `classify` concurrently from many threads.
pub trait Classifier: Send + Sync {
    /// Select a class and return the distribution from the same evaluation
    fn classify(&self, features: &[f32]) -> Result<Classification>;

    /// Input width the classifier was built for, when known
    fn num_features(&self) -> Option<usize> {
        None
    }
}
