//! Symptom encoding
//!
//! Turns user-supplied symptom strings into the ordered feature vector the
//! classifier was trained on:
//! - normalization of raw strings
//! - matching against the training vocabulary
//! - binary and aggregate feature assembly in schema order

mod features;
mod normalizer;
mod vocabulary;

pub use features::{
    binary_feature_name, EncodedSymptoms, FeatureBuilder, FeatureSchema, SymptomFrequency,
    SEVERITY_RATIO, SEVERITY_SCORE, SYMPTOM_COUNT,
};
pub use normalizer::normalize;
pub use vocabulary::{match_symptom, SymptomVocabulary};
