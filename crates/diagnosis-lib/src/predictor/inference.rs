//! Classifier invocation
//!
//! Applies the optional fitted scaler, runs the classifier once and derives
//! the confidence from the class the classifier itself selected.

use super::{Classifier, StandardScaler};
use crate::error::{PredictionError, Result};
use crate::models::FeatureVector;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
pub const MAX_INFERENCE_MS: u128 = 5;

/// Outcome of a single classifier call
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    pub class_index: usize,
    pub distribution: Vec<f32>,
    /// `distribution[class_index]`
    pub confidence: f32,
    /// True when the fitted scaler was applied to the input
    pub scaled: bool,
    /// True when a fitted scaler exists but could not be applied to this input
    pub scaling_fallback: bool,
}

/// Inference statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
    pub scaling_fallbacks: u64,
}

/// Owns the classifier and the optional scaler for the process lifetime
pub struct InferenceAdapter {
    classifier: Arc<dyn Classifier>,
    scaler: Option<StandardScaler>,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
    scaling_fallback_count: AtomicU64,
}

impl InferenceAdapter {
    pub fn new(classifier: Arc<dyn Classifier>, scaler: Option<StandardScaler>) -> Self {
        Self {
            classifier,
            scaler,
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
            scaling_fallback_count: AtomicU64::new(0),
        }
    }

    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    /// Classify a feature vector.
    ///
    /// A scaler that cannot be applied degrades to the unscaled vector
    /// instead of failing the request.
    pub fn infer(&self, vector: &FeatureVector) -> Result<Inference> {
        let start = Instant::now();

        let (input, scaled) = self.scale(vector);
        let classification = self
            .classifier
            .classify(&input)
            .map_err(PredictionError::Classifier)?;

        let class_index = classification.class_index;
        let distribution = classification.probabilities;
        let confidence = *distribution.get(class_index).ok_or_else(|| {
            PredictionError::ClassifierOutput(format!(
                "selected class {} outside distribution of {} classes",
                class_index,
                distribution.len()
            ))
        })?;
        if let Some((idx, p)) = distribution
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(PredictionError::ClassifierOutput(format!(
                "probability {} for class {} is outside [0, 1]",
                p, idx
            )));
        }

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), class_index, confidence, "Inference completed");
        }

        Ok(Inference {
            class_index,
            distribution,
            confidence,
            scaled,
            scaling_fallback: self.scaler.is_some() && !scaled,
        })
    }

    fn scale(&self, vector: &FeatureVector) -> (Vec<f32>, bool) {
        let Some(scaler) = &self.scaler else {
            return (vector.to_vec(), false);
        };
        match scaler.transform(vector) {
            Ok(scaled) => (scaled, true),
            Err(e) => {
                self.scaling_fallback_count.fetch_add(1, Ordering::Relaxed);
                warn!(
                    event = "scaling_fallback",
                    error = %e,
                    "Scaler could not be applied, classifying unscaled features"
                );
                (vector.to_vec(), false)
            }
        }
    }

    /// Get inference statistics
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
            scaling_fallbacks: self.scaling_fallback_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classification;
    use std::sync::Mutex;

    /// Returns a fixed classification and records the input it saw
    struct FixedClassifier {
        class_index: usize,
        probabilities: Vec<f32>,
        seen: Mutex<Vec<Vec<f32>>>,
    }

    impl FixedClassifier {
        fn new(class_index: usize, probabilities: Vec<f32>) -> Arc<Self> {
            Arc::new(Self {
                class_index,
                probabilities,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last_input(&self) -> Vec<f32> {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Classifier for FixedClassifier {
        fn classify(&self, features: &[f32]) -> anyhow::Result<Classification> {
            self.seen.lock().unwrap().push(features.to_vec());
            Ok(Classification {
                class_index: self.class_index,
                probabilities: self.probabilities.clone(),
            })
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn classify(&self, _features: &[f32]) -> anyhow::Result<Classification> {
            anyhow::bail!("model exploded")
        }
    }

    fn vector(values: &[f32]) -> FeatureVector {
        FeatureVector::new(values.to_vec())
    }

    #[test]
    fn test_confidence_is_selected_class_probability() {
        // Classifier picks class 1 although class 2 is more probable
        let classifier = FixedClassifier::new(1, vec![0.1, 0.3, 0.6]);
        let adapter = InferenceAdapter::new(classifier, None);
        let inference = adapter.infer(&vector(&[1.0, 0.0])).unwrap();
        assert_eq!(inference.class_index, 1);
        assert_eq!(inference.confidence, 0.3);
        assert_eq!(inference.confidence, inference.distribution[inference.class_index]);
    }

    #[test]
    fn test_scaler_applied() {
        let classifier = FixedClassifier::new(0, vec![1.0]);
        let scaler = StandardScaler::new(vec![1.0, 1.0], vec![2.0, 2.0]);
        let adapter = InferenceAdapter::new(classifier.clone(), Some(scaler));
        let inference = adapter.infer(&vector(&[3.0, 1.0])).unwrap();
        assert!(inference.scaled);
        assert!(!inference.scaling_fallback);
        assert_eq!(classifier.last_input(), vec![1.0, 0.0]);
        assert_eq!(adapter.stats().scaling_fallbacks, 0);
    }

    #[test]
    fn test_stale_scaler_falls_back_to_unscaled() {
        let classifier = FixedClassifier::new(0, vec![0.8, 0.2]);
        let scaler = StandardScaler::new(vec![0.0; 4], vec![1.0; 4]);
        let adapter = InferenceAdapter::new(classifier.clone(), Some(scaler));
        let inference = adapter.infer(&vector(&[5.0, 7.0])).unwrap();
        assert!(!inference.scaled);
        assert!(inference.scaling_fallback);
        assert_eq!(classifier.last_input(), vec![5.0, 7.0]);
        assert_eq!(adapter.stats().scaling_fallbacks, 1);
        assert_eq!(adapter.stats().total_inferences, 1);
    }

    #[test]
    fn test_class_outside_distribution() {
        let adapter = InferenceAdapter::new(FixedClassifier::new(3, vec![0.5, 0.5]), None);
        let err = adapter.infer(&vector(&[0.0])).unwrap_err();
        assert!(matches!(err, PredictionError::ClassifierOutput(_)));
    }

    #[test]
    fn test_probability_out_of_range() {
        let adapter = InferenceAdapter::new(FixedClassifier::new(0, vec![1.2, -0.2]), None);
        let err = adapter.infer(&vector(&[0.0])).unwrap_err();
        assert!(matches!(err, PredictionError::ClassifierOutput(_)));
    }

    #[test]
    fn test_classifier_failure_propagates() {
        let adapter = InferenceAdapter::new(Arc::new(FailingClassifier), None);
        let err = adapter.infer(&vector(&[0.0])).unwrap_err();
        assert!(matches!(err, PredictionError::Classifier(_)));
        assert_eq!(adapter.stats().total_inferences, 0);
    }
}
