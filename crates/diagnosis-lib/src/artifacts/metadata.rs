//! Serialized metadata record written at training time

use crate::predictor::StandardScaler;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Model version reported when the metadata does not carry one
pub const DEFAULT_MODEL_VERSION: &str = "unversioned";

/// Metadata artifact as exported by the training pipeline.
///
/// Field names follow the exported JSON. Everything the pipeline needs is
/// required; only the scaler and the provenance fields are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Ordered feature names, the classifier's input contract
    pub feature_cols: Vec<String>,
    /// Training vocabulary in export order
    pub unique_symptoms: Vec<String>,
    /// Occurrence count per symptom
    pub symptom_freq: HashMap<String, u64>,
    /// Class index (decimal string) to disease name
    pub disease_mapping: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
    #[serde(default = "default_model_version")]
    pub model_version: String,
    /// Hex SHA-256 of the classifier artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_sha256: Option<String>,
}

fn default_model_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}
