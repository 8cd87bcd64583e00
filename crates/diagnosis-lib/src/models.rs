//! Core data models for the diagnosis pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Deref;

/// Ordered numeric input for the classifier.
///
/// Length and positions always follow the feature schema the vector was
/// built against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl Deref for FeatureVector {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.0
    }
}

/// Raw classifier output for a single feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Class index selected by the classifier
    pub class_index: usize,
    /// Probability per class index, from the same classifier call
    pub probabilities: Vec<f32>,
}

/// Disease prediction returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub disease: String,
    pub confidence: f32,
    pub matched_symptoms: Vec<String>,
    pub unmatched_symptoms: Vec<String>,
    pub probabilities: BTreeMap<String, f32>,
    pub model_version: String,
    pub generated_at: i64,
    /// Set when the fitted scaler could not be applied to this request
    #[serde(default, skip_serializing)]
    pub scaling_fallback: bool,
}

impl PredictionResult {
    /// The `n` most probable diseases, highest first. Ties keep name order.
    pub fn top(&self, n: usize) -> Vec<(&str, f32)> {
        let mut ranked: Vec<(&str, f32)> = self
            .probabilities
            .iter()
            .map(|(disease, p)| (disease.as_str(), *p))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(n);
        ranked
    }
}
