//! End-to-end symptom diagnosis pipeline

use super::{InferenceAdapter, InferenceStats, ResultComposer};
use crate::artifacts::ModelArtifacts;
use crate::encoding::{FeatureBuilder, SymptomVocabulary};
use crate::error::Result;
use crate::models::PredictionResult;
use std::fmt;
use tracing::debug;

/// Normalize, match, encode, classify and compose, over frozen artifacts.
///
/// Holds no per-request state, so one instance can serve concurrent callers
/// behind an `Arc` without locking.
pub struct DiagnosisPipeline {
    builder: FeatureBuilder,
    adapter: InferenceAdapter,
    composer: ResultComposer,
}

impl fmt::Debug for DiagnosisPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosisPipeline")
            .field("features", &self.builder.schema().len())
            .field("symptoms", &self.builder.vocabulary().len())
            .field("diseases", &self.composer.mapping().len())
            .field("scaler", &self.adapter.has_scaler())
            .field("model_version", &self.composer.model_version())
            .finish()
    }
}

impl DiagnosisPipeline {
    pub fn new(artifacts: ModelArtifacts) -> Self {
        let ModelArtifacts {
            builder,
            mapping,
            scaler,
            classifier,
            model_version,
        } = artifacts;
        Self {
            builder,
            adapter: InferenceAdapter::new(classifier, scaler),
            composer: ResultComposer::new(mapping, model_version),
        }
    }

    /// Predict a disease from free-text symptoms.
    ///
    /// Symptoms that match nothing come back in `unmatched_symptoms`; only
    /// artifact inconsistencies fail the call.
    pub fn predict<S: AsRef<str>>(&self, symptoms: &[S]) -> Result<PredictionResult> {
        let encoded = self.builder.build(symptoms)?;
        debug!(
            matched = encoded.matched.len(),
            unmatched = encoded.unmatched.len(),
            "Symptoms encoded"
        );

        let inference = self.adapter.infer(&encoded.vector)?;
        self.composer
            .compose(&inference, encoded.matched, encoded.unmatched)
    }

    pub fn vocabulary(&self) -> &SymptomVocabulary {
        self.builder.vocabulary()
    }

    pub fn model_version(&self) -> &str {
        self.composer.model_version()
    }

    pub fn num_features(&self) -> usize {
        self.builder.schema().len()
    }

    pub fn num_diseases(&self) -> usize {
        self.composer.mapping().len()
    }

    pub fn has_scaler(&self) -> bool {
        self.adapter.has_scaler()
    }

    pub fn stats(&self) -> InferenceStats {
        self.adapter.stats()
    }
}
