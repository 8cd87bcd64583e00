//! Prediction result composition
//!
//! Maps class indices back to disease names and packages the diagnostics
//! returned to callers.

use super::Inference;
use crate::error::{PredictionError, Result};
use crate::models::PredictionResult;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Bijective class index to disease name mapping from training
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiseaseMapping {
    names: BTreeMap<usize, String>,
}

impl DiseaseMapping {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        Self {
            names: entries.into_iter().map(|(i, n)| (i, n.into())).collect(),
        }
    }

    pub fn disease(&self, class_index: usize) -> Option<&str> {
        self.names.get(&class_index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the first disease that appears under two class indices
    pub(crate) fn first_duplicate(&self) -> Option<&str> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (idx, name) in &self.names {
            if seen.insert(name.as_str(), *idx).is_some() {
                return Some(name.as_str());
            }
        }
        None
    }
}

/// Builds `PredictionResult`s from classifier output
#[derive(Debug, Clone)]
pub struct ResultComposer {
    mapping: DiseaseMapping,
    model_version: String,
}

impl ResultComposer {
    pub fn new(mapping: DiseaseMapping, model_version: impl Into<String>) -> Self {
        Self {
            mapping,
            model_version: model_version.into(),
        }
    }

    pub fn mapping(&self) -> &DiseaseMapping {
        &self.mapping
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Package an inference with its matching diagnostics.
    ///
    /// An unmapped predicted class fails the request; unmapped entries of
    /// the distribution are only dropped.
    pub fn compose(
        &self,
        inference: &Inference,
        matched: Vec<String>,
        unmatched: Vec<String>,
    ) -> Result<PredictionResult> {
        let disease = self
            .mapping
            .disease(inference.class_index)
            .ok_or(PredictionError::UnknownClassIndex(inference.class_index))?;

        let mut probabilities = BTreeMap::new();
        for (idx, p) in inference.distribution.iter().enumerate() {
            match self.mapping.disease(idx) {
                Some(name) => {
                    probabilities.insert(name.to_string(), *p);
                }
                None => {
                    warn!(
                        class_index = idx,
                        probability = *p,
                        "Dropping probability for class with no disease mapping"
                    );
                }
            }
        }

        Ok(PredictionResult {
            disease: disease.to_string(),
            confidence: inference.confidence,
            matched_symptoms: matched,
            unmatched_symptoms: unmatched,
            probabilities,
            model_version: self.model_version.clone(),
            generated_at: chrono::Utc::now().timestamp(),
            scaling_fallback: inference.scaling_fallback,
        })
    }
}
