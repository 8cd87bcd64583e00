//! Model artifact loading and validation
//!
//! Reads the classifier and metadata artifacts once at startup and validates
//! them in a single pass. A pipeline is only ever built from a fully
//! populated `ModelArtifacts`; inconsistencies are reported here rather than
//! on the first request.

mod metadata;

pub use metadata::{ModelMetadata, DEFAULT_MODEL_VERSION};

use crate::encoding::{
    normalize, FeatureBuilder, FeatureSchema, SymptomFrequency, SymptomVocabulary,
    SEVERITY_SCORE, SYMPTOM_COUNT,
};
use crate::error::{ArtifactError, PredictionError};
use crate::predictor::{Classifier, DiseaseMapping, OnnxClassifier, StandardScaler};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Validated, immutable artifact bundle shared by every request
#[derive(Clone)]
pub struct ModelArtifacts {
    pub(crate) builder: FeatureBuilder,
    pub(crate) mapping: DiseaseMapping,
    pub(crate) scaler: Option<StandardScaler>,
    pub(crate) classifier: Arc<dyn Classifier>,
    pub(crate) model_version: String,
}

impl fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("features", &self.builder.schema().len())
            .field("symptoms", &self.builder.vocabulary().len())
            .field("diseases", &self.mapping.len())
            .field("scaler", &self.scaler.is_some())
            .field("model_version", &self.model_version)
            .finish()
    }
}

impl ModelArtifacts {
    /// Validate metadata against a classifier and assemble the bundle
    pub fn from_parts(
        metadata: ModelMetadata,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, ArtifactError> {
        let vocabulary = validate_vocabulary(&metadata.unique_symptoms)?;
        let frequency = trimmed_frequency(&metadata.symptom_freq);
        let schema = validate_schema(&metadata.feature_cols)?;
        let mapping = validate_mapping(&metadata.disease_mapping)?;

        if let Some(width) = classifier.num_features() {
            if width != schema.len() {
                return Err(ArtifactError::Invalid(format!(
                    "classifier expects {} features, schema declares {}",
                    width,
                    schema.len()
                )));
            }
        }

        let scaler = metadata.scaler;
        if let Some(scaler) = &scaler {
            if scaler.mean.len() != scaler.scale.len() {
                return Err(ArtifactError::Invalid(format!(
                    "scaler mean has {} entries, scale has {}",
                    scaler.mean.len(),
                    scaler.scale.len()
                )));
            }
            if scaler.dimension() != schema.len() {
                warn!(
                    scaler_dimension = scaler.dimension(),
                    schema_len = schema.len(),
                    "Scaler does not match feature schema, predictions will use unscaled features"
                );
            }
        }

        let builder = FeatureBuilder::new(vocabulary, schema, frequency);
        let empty: [&str; 0] = [];
        builder.build(&empty).map_err(|e| match e {
            PredictionError::SchemaMismatch { .. } => ArtifactError::Invalid(e.to_string()),
            other => ArtifactError::Invalid(format!("feature layout check failed: {}", other)),
        })?;

        Ok(Self {
            builder,
            mapping,
            scaler,
            classifier,
            model_version: metadata.model_version,
        })
    }

    pub fn vocabulary(&self) -> &SymptomVocabulary {
        self.builder.vocabulary()
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.builder.schema()
    }

    pub fn mapping(&self) -> &DiseaseMapping {
        &self.mapping
    }

    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }
}

/// Loads the classifier and metadata artifacts from disk
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    model_path: PathBuf,
    metadata_path: PathBuf,
}

impl ArtifactLoader {
    pub fn new(model_path: impl Into<PathBuf>, metadata_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            metadata_path: metadata_path.into(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    /// Read and parse the metadata artifact without validating it
    pub fn read_metadata(&self) -> Result<ModelMetadata, ArtifactError> {
        let content =
            std::fs::read_to_string(&self.metadata_path).map_err(|source| ArtifactError::Io {
                path: self.metadata_path.clone(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
            path: self.metadata_path.clone(),
            source,
        })
    }

    /// Load both artifacts and validate them together
    pub fn load(&self) -> Result<ModelArtifacts, ArtifactError> {
        let metadata = self.read_metadata()?;

        let model_bytes = std::fs::read(&self.model_path).map_err(|source| ArtifactError::Io {
            path: self.model_path.clone(),
            source,
        })?;
        let checksum = compute_checksum(&model_bytes);
        if let Some(expected) = &metadata.model_sha256 {
            if !expected.eq_ignore_ascii_case(&checksum) {
                return Err(ArtifactError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual: checksum,
                });
            }
        }

        let classifier = OnnxClassifier::new(&model_bytes, metadata.feature_cols.len())
            .map_err(ArtifactError::Model)?;
        let artifacts = ModelArtifacts::from_parts(metadata, Arc::new(classifier))?;

        info!(
            model_path = ?self.model_path,
            metadata_path = ?self.metadata_path,
            model_version = %artifacts.model_version,
            checksum = %checksum,
            features = artifacts.schema().len(),
            symptoms = artifacts.vocabulary().len(),
            diseases = artifacts.mapping.len(),
            "Model artifacts loaded"
        );
        Ok(artifacts)
    }
}

/// Hex-encoded SHA-256 of an artifact
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// The training export prefixes symptoms with a space; entries are trimmed
// so vocabulary, frequency and feature names agree.
fn validate_vocabulary(symptoms: &[String]) -> Result<SymptomVocabulary, ArtifactError> {
    if symptoms.is_empty() {
        return Err(ArtifactError::Invalid("symptom vocabulary is empty".to_string()));
    }
    let mut seen: HashMap<String, &str> = HashMap::new();
    for symptom in symptoms {
        let normalized = normalize(symptom);
        if normalized.is_empty() {
            return Err(ArtifactError::Invalid(format!(
                "vocabulary entry {:?} normalizes to an empty string",
                symptom
            )));
        }
        if let Some(previous) = seen.insert(normalized, symptom) {
            return Err(ArtifactError::Invalid(format!(
                "vocabulary entries {:?} and {:?} are indistinguishable after normalization",
                previous, symptom
            )));
        }
    }
    Ok(SymptomVocabulary::new(symptoms.iter().map(|s| s.trim())))
}

fn trimmed_frequency(counts: &HashMap<String, u64>) -> SymptomFrequency {
    let mut merged: HashMap<&str, u64> = HashMap::new();
    for (symptom, count) in counts {
        *merged.entry(symptom.trim()).or_default() += count;
    }
    SymptomFrequency::new(merged)
}

fn validate_schema(names: &[String]) -> Result<FeatureSchema, ArtifactError> {
    if names.is_empty() {
        return Err(ArtifactError::Invalid("feature schema is empty".to_string()));
    }
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ArtifactError::Invalid(format!(
                "feature {:?} appears twice in schema",
                name
            )));
        }
    }
    for required in [SYMPTOM_COUNT, SEVERITY_SCORE] {
        if !seen.contains(required) {
            return Err(ArtifactError::Invalid(format!(
                "feature schema lacks {:?}",
                required
            )));
        }
    }
    Ok(FeatureSchema::new(names.iter().cloned()))
}

fn validate_mapping(
    entries: &std::collections::BTreeMap<String, String>,
) -> Result<DiseaseMapping, ArtifactError> {
    if entries.is_empty() {
        return Err(ArtifactError::Invalid("disease mapping is empty".to_string()));
    }
    let parsed = entries
        .iter()
        .map(|(key, name)| {
            key.trim()
                .parse::<usize>()
                .map(|idx| (idx, name.clone()))
                .map_err(|_| {
                    ArtifactError::Invalid(format!("disease mapping key {:?} is not a class index", key))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mapping = DiseaseMapping::new(parsed);
    if mapping.len() != entries.len() {
        return Err(ArtifactError::Invalid(
            "disease mapping has duplicate class indices".to_string(),
        ));
    }
    if let Some(name) = mapping.first_duplicate() {
        return Err(ArtifactError::Invalid(format!(
            "disease {:?} is mapped to more than one class index",
            name
        )));
    }
    Ok(mapping)
}
