//! Feature vector assembly
//!
//! Reconstructs the training-time feature layout from the frozen metadata:
//! one binary presence flag per vocabulary symptom plus aggregate features
//! over the matched symptoms. Values are emitted strictly in schema order.

use super::{match_symptom, normalize, SymptomVocabulary};
use crate::error::{PredictionError, Result};
use crate::models::FeatureVector;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Number of distinct matched symptoms
pub const SYMPTOM_COUNT: &str = "symptom_count";

/// Sum of frequency weights over matched symptoms
pub const SEVERITY_SCORE: &str = "severity_score";

/// `severity_score / (symptom_count + 1)`, only when the schema names it
pub const SEVERITY_RATIO: &str = "severity_ratio";

/// Name of the binary feature for a vocabulary symptom, as the training
/// script derives it.
pub fn binary_feature_name(symptom: &str) -> String {
    format!("has_{}", symptom.trim().replace(' ', "_"))
}

/// Ordered feature names expected by the classifier
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// Per-symptom occurrence counts from training, used as severity weights
#[derive(Debug, Clone, Default)]
pub struct SymptomFrequency {
    counts: HashMap<String, u64>,
}

impl SymptomFrequency {
    pub fn new<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            counts: counts.into_iter().map(|(s, c)| (s.into(), c)).collect(),
        }
    }

    /// Weight of a symptom; unknown symptoms weigh nothing
    pub fn weight(&self, symptom: &str) -> u64 {
        self.counts.get(symptom).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Output of encoding one symptom list
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSymptoms {
    pub vector: FeatureVector,
    /// Canonical vocabulary entries, first occurrence order, no duplicates
    pub matched: Vec<String>,
    /// Normalized inputs with no vocabulary match
    pub unmatched: Vec<String>,
}

/// Builds classifier input from raw symptom lists
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    vocabulary: SymptomVocabulary,
    schema: FeatureSchema,
    frequency: SymptomFrequency,
    binary_names: Vec<String>,
}

impl FeatureBuilder {
    pub fn new(
        vocabulary: SymptomVocabulary,
        schema: FeatureSchema,
        frequency: SymptomFrequency,
    ) -> Self {
        let binary_names = vocabulary.iter().map(binary_feature_name).collect();
        Self {
            vocabulary,
            schema,
            frequency,
            binary_names,
        }
    }

    pub fn vocabulary(&self) -> &SymptomVocabulary {
        &self.vocabulary
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Encode a symptom list into a schema-ordered feature vector
    pub fn build<S: AsRef<str>>(&self, symptoms: &[S]) -> Result<EncodedSymptoms> {
        let mut matched: Vec<String> = Vec::new();
        let mut unmatched: Vec<String> = Vec::new();

        for raw in symptoms {
            let normalized = normalize(raw.as_ref());
            if normalized.is_empty() {
                debug!(raw = %raw.as_ref(), "Symptom normalized to empty string, skipping");
                continue;
            }
            match match_symptom(&normalized, &self.vocabulary) {
                Some(canonical) => {
                    if !matched.iter().any(|m| m == canonical) {
                        matched.push(canonical.to_string());
                    }
                }
                None => unmatched.push(normalized),
            }
        }

        let computed = self.compute_features(&matched);
        let vector = self.assemble(&computed)?;

        Ok(EncodedSymptoms {
            vector,
            matched,
            unmatched,
        })
    }

    fn compute_features(&self, matched: &[String]) -> HashMap<String, f32> {
        let mut features: HashMap<String, f32> = self
            .binary_names
            .iter()
            .map(|name| (name.clone(), 0.0))
            .collect();

        for symptom in matched {
            features.insert(binary_feature_name(symptom), 1.0);
        }

        let symptom_count = matched.len() as f32;
        let severity_score: u64 = matched.iter().map(|s| self.frequency.weight(s)).sum();
        let severity_score = severity_score as f32;

        features.insert(SYMPTOM_COUNT.to_string(), symptom_count);
        features.insert(SEVERITY_SCORE.to_string(), severity_score);
        if self.schema.contains(SEVERITY_RATIO) {
            features.insert(
                SEVERITY_RATIO.to_string(),
                severity_score / (symptom_count + 1.0),
            );
        }
        features
    }

    fn assemble(&self, computed: &HashMap<String, f32>) -> Result<FeatureVector> {
        let expected = self.schema.len();
        if computed.len() != expected {
            let declared: HashSet<&str> = self.schema.names().iter().map(String::as_str).collect();
            let mut extra: Vec<&str> = computed
                .keys()
                .map(String::as_str)
                .filter(|k| !declared.contains(k))
                .collect();
            extra.sort_unstable();
            return Err(PredictionError::SchemaMismatch {
                expected,
                computed: computed.len(),
                detail: if extra.is_empty() {
                    "metadata artifact is stale or incompatible".to_string()
                } else {
                    format!("features missing from schema: {}", extra.join(", "))
                },
            });
        }

        let values = self
            .schema
            .names()
            .iter()
            .map(|name| {
                computed
                    .get(name)
                    .copied()
                    .ok_or_else(|| PredictionError::SchemaMismatch {
                        expected,
                        computed: computed.len(),
                        detail: format!("schema feature '{}' is not computed", name),
                    })
            })
            .collect::<Result<Vec<f32>>>()?;

        Ok(FeatureVector::new(values))
    }
}
