//! End-to-end tests for the diagnosis pipeline
//!
//! A linear stub stands in for the trained classifier so the tests exercise
//! encoding, inference and composition against synthetic vocabularies.

use diagnosis_lib::artifacts::{compute_checksum, ArtifactLoader, ModelArtifacts, ModelMetadata};
use diagnosis_lib::error::{ArtifactError, PredictionError};
use diagnosis_lib::predictor::{Classifier, DiagnosisPipeline};
use diagnosis_lib::Classification;
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

/// Scores each class as a weighted sum of features, softmax over scores
struct LinearStub {
    weights: Vec<Vec<f32>>,
    inputs: Mutex<Vec<Vec<f32>>>,
}

impl LinearStub {
    fn new(weights: Vec<Vec<f32>>) -> Arc<Self> {
        Arc::new(Self {
            weights,
            inputs: Mutex::new(Vec::new()),
        })
    }

    fn last_input(&self) -> Vec<f32> {
        self.inputs.lock().unwrap().last().cloned().unwrap()
    }
}

impl Classifier for LinearStub {
    fn classify(&self, features: &[f32]) -> anyhow::Result<Classification> {
        self.inputs.lock().unwrap().push(features.to_vec());
        let scores: Vec<f32> = self
            .weights
            .iter()
            .map(|w| w.iter().zip(features).map(|(a, b)| a * b).sum())
            .collect();
        let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f32 = exp.iter().sum();
        let probabilities: Vec<f32> = exp.iter().map(|e| e / total).collect();
        let class_index = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        Ok(Classification {
            class_index,
            probabilities,
        })
    }

    fn num_features(&self) -> Option<usize> {
        self.weights.first().map(Vec::len)
    }
}

const METADATA: &str = r#"{
    "feature_cols": ["has_fever", "has_headache", "has_cough", "symptom_count", "severity_score"],
    "unique_symptoms": ["fever", "headache", "cough"],
    "symptom_freq": {"fever": 10, "headache": 5, "cough": 3},
    "disease_mapping": {"0": "Common Cold", "1": "Migraine", "2": "Influenza"},
    "model_version": "v1.2.0"
}"#;

fn metadata() -> ModelMetadata {
    serde_json::from_str(METADATA).unwrap()
}

/// Cold on cough, migraine on headache, influenza on fever
fn stub() -> Arc<LinearStub> {
    LinearStub::new(vec![
        vec![0.0, 0.0, 4.0, 0.0, 0.0],
        vec![0.0, 4.0, 0.0, 0.0, 0.0],
        vec![4.0, 0.0, 0.0, 0.0, 0.0],
    ])
}

fn pipeline_with(classifier: Arc<LinearStub>) -> DiagnosisPipeline {
    let artifacts = ModelArtifacts::from_parts(metadata(), classifier).unwrap();
    DiagnosisPipeline::new(artifacts)
}

#[test]
fn test_predict_encodes_flags_and_severity_in_schema_order() {
    let classifier = stub();
    let pipeline = pipeline_with(classifier.clone());

    let result = pipeline.predict(&["Fever", "  HEADACHE  "]).unwrap();

    assert_eq!(classifier.last_input(), vec![1.0, 1.0, 0.0, 2.0, 15.0]);
    assert_eq!(result.matched_symptoms, vec!["fever", "headache"]);
    assert!(result.unmatched_symptoms.is_empty());
    assert_eq!(result.model_version, "v1.2.0");
}

#[test]
fn test_predict_selects_disease() {
    let pipeline = pipeline_with(stub());

    let result = pipeline.predict(&["cough"]).unwrap();
    assert_eq!(result.disease, "Common Cold");

    let result = pipeline.predict(&["feve"]).unwrap();
    assert_eq!(result.disease, "Influenza");
    assert_eq!(result.matched_symptoms, vec!["fever"]);
}

#[test]
fn test_confidence_matches_distribution() {
    let pipeline = pipeline_with(stub());
    let result = pipeline.predict(&["headache"]).unwrap();

    assert!((0.0..=1.0).contains(&result.confidence));
    assert_eq!(result.confidence, result.probabilities[&result.disease]);
    assert_eq!(result.probabilities.len(), 3);
    let total: f32 = result.probabilities.values().sum();
    assert!((total - 1.0).abs() < 1e-5);
}

#[test]
fn test_unknown_symptoms_reported() {
    let classifier = stub();
    let pipeline = pipeline_with(classifier.clone());

    let result = pipeline.predict(&["unknown_symptom_xyz"]).unwrap();

    assert!(result.matched_symptoms.is_empty());
    assert_eq!(result.unmatched_symptoms, vec!["unknown_symptom_xyz"]);
    assert!(classifier.last_input().iter().all(|v| *v == 0.0));
}

#[test]
fn test_empty_symptom_list() {
    let classifier = stub();
    let pipeline = pipeline_with(classifier.clone());
    let empty: [&str; 0] = [];

    let result = pipeline.predict(&empty).unwrap();

    assert_eq!(classifier.last_input(), vec![0.0; 5]);
    assert!(result.matched_symptoms.is_empty());
}

#[test]
fn test_top_diseases() {
    let pipeline = pipeline_with(stub());
    let result = pipeline.predict(&["fever"]).unwrap();
    let top = result.top(2);
    assert_eq!(top.len(), 2);
    assert!(top[0].1 >= top[1].1);
    assert_eq!(top[0].0, result.disease);
}

#[test]
fn test_stale_scaler_degrades() {
    let mut m = metadata();
    m.scaler = Some(diagnosis_lib::predictor::StandardScaler::new(
        vec![0.0; 4],
        vec![1.0; 4],
    ));
    let classifier = stub();
    let pipeline = DiagnosisPipeline::new(ModelArtifacts::from_parts(m, classifier.clone()).unwrap());

    let result = pipeline.predict(&["cough"]).unwrap();

    assert_eq!(result.disease, "Common Cold");
    assert_eq!(classifier.last_input(), vec![0.0, 0.0, 1.0, 1.0, 3.0]);
    assert!(result.scaling_fallback);
    assert_eq!(pipeline.stats().scaling_fallbacks, 1);
}

#[test]
fn test_concurrent_scaling_fallbacks_flag_each_result() {
    let mut m = metadata();
    m.scaler = Some(diagnosis_lib::predictor::StandardScaler::new(
        vec![0.0; 4],
        vec![1.0; 4],
    ));
    let pipeline = Arc::new(DiagnosisPipeline::new(
        ModelArtifacts::from_parts(m, stub()).unwrap(),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = pipeline.clone();
            thread::spawn(move || {
                (0..25)
                    .filter(|_| pipeline.predict(&["fever"]).unwrap().scaling_fallback)
                    .count()
            })
        })
        .collect();

    let flagged: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(flagged, 200);
    assert_eq!(pipeline.stats().scaling_fallbacks, 200);
}

#[test]
fn test_fitted_scaler_does_not_flag_fallback() {
    let mut m = metadata();
    m.scaler = Some(diagnosis_lib::predictor::StandardScaler::new(
        vec![0.0; 5],
        vec![1.0; 5],
    ));
    let pipeline = DiagnosisPipeline::new(ModelArtifacts::from_parts(m, stub()).unwrap());

    let result = pipeline.predict(&["fever"]).unwrap();
    assert!(!result.scaling_fallback);
    assert_eq!(pipeline.stats().scaling_fallbacks, 0);
}

#[test]
fn test_unmapped_prediction_fails_request() {
    let mut m = metadata();
    m.disease_mapping.remove("2");
    let pipeline = DiagnosisPipeline::new(ModelArtifacts::from_parts(m, stub()).unwrap());

    let err = pipeline.predict(&["fever"]).unwrap_err();
    assert!(matches!(err, PredictionError::UnknownClassIndex(2)));

    let result = pipeline.predict(&["cough"]).unwrap();
    assert_eq!(result.probabilities.len(), 2);
}

#[test]
fn test_independent_pipelines_coexist() {
    let cold_only = LinearStub::new(vec![vec![1.0, 1.0, 1.0, 0.0]]);
    let other: ModelMetadata = serde_json::from_str(
        r#"{
            "feature_cols": ["has_sneezing", "has_chills", "symptom_count", "severity_score"],
            "unique_symptoms": ["sneezing", "chills"],
            "symptom_freq": {"sneezing": 2},
            "disease_mapping": {"0": "Allergy"}
        }"#,
    )
    .unwrap();
    let a = pipeline_with(stub());
    let b = DiagnosisPipeline::new(ModelArtifacts::from_parts(other, cold_only).unwrap());

    assert_eq!(b.predict(&["sneezing"]).unwrap().disease, "Allergy");
    assert_eq!(a.predict(&["sneezing"]).unwrap().unmatched_symptoms, vec!["sneezing"]);
    assert_eq!(a.vocabulary().sorted(), vec!["cough", "fever", "headache"]);
}

#[test]
fn test_concurrent_predictions() {
    let pipeline = Arc::new(pipeline_with(stub()));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = pipeline.clone();
            thread::spawn(move || {
                let symptom = ["fever", "headache", "cough"][i % 3];
                (0..25)
                    .map(|_| pipeline.predict(&[symptom]).unwrap().disease)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let expected = ["Influenza", "Migraine", "Common Cold"][i % 3];
        assert!(handle.join().unwrap().iter().all(|d| d == expected));
    }
    assert_eq!(pipeline.stats().total_inferences, 200);
}

#[test]
fn test_loader_reads_metadata() {
    let dir = TempDir::new().unwrap();
    let metadata_path = dir.path().join("model_metadata.json");
    std::fs::write(&metadata_path, METADATA).unwrap();

    let loader = ArtifactLoader::new(dir.path().join("model.onnx"), &metadata_path);
    let metadata = loader.read_metadata().unwrap();
    assert_eq!(metadata.unique_symptoms.len(), 3);
}

#[test]
fn test_loader_missing_metadata() {
    let dir = TempDir::new().unwrap();
    let loader = ArtifactLoader::new(dir.path().join("model.onnx"), dir.path().join("missing.json"));
    assert!(matches!(loader.load(), Err(ArtifactError::Io { .. })));
}

#[test]
fn test_loader_malformed_metadata() {
    let dir = TempDir::new().unwrap();
    let metadata_path = dir.path().join("model_metadata.json");
    std::fs::write(&metadata_path, "{ not json").unwrap();

    let loader = ArtifactLoader::new(dir.path().join("model.onnx"), &metadata_path);
    assert!(matches!(loader.load(), Err(ArtifactError::Parse { .. })));
}

#[test]
fn test_loader_checksum_mismatch() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("model.onnx");
    std::fs::write(&model_path, b"model bytes").unwrap();

    let mut m = metadata();
    m.model_sha256 = Some(compute_checksum(b"other bytes"));
    let metadata_path = dir.path().join("model_metadata.json");
    std::fs::write(&metadata_path, serde_json::to_string(&m).unwrap()).unwrap();

    let err = ArtifactLoader::new(&model_path, &metadata_path).load().unwrap_err();
    match err {
        ArtifactError::ChecksumMismatch { actual, .. } => {
            assert_eq!(actual, compute_checksum(b"model bytes"))
        }
        other => panic!("expected ChecksumMismatch, got {:?}", other),
    }
}

#[test]
fn test_loader_rejects_invalid_model() {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("model.onnx");
    std::fs::write(&model_path, b"model bytes").unwrap();
    let metadata_path = dir.path().join("model_metadata.json");
    std::fs::write(&metadata_path, METADATA).unwrap();

    let err = ArtifactLoader::new(&model_path, &metadata_path).load().unwrap_err();
    assert!(matches!(err, ArtifactError::Model(_)));
}

#[test]
fn test_pipeline_debug_summary() {
    let pipeline = pipeline_with(stub());
    let summary = format!("{:?}", pipeline);
    assert!(summary.contains("DiagnosisPipeline"));
    assert!(summary.contains("features: 5"));
    assert!(summary.contains("diseases: 3"));
    assert!(summary.contains("\"v1.2.0\""));

    // A failed load surfaced through a pipeline result can be unwrapped directly
    let dir = TempDir::new().unwrap();
    let err = ArtifactLoader::new(dir.path().join("model.onnx"), dir.path().join("missing.json"))
        .load()
        .map(DiagnosisPipeline::new)
        .unwrap_err();
    assert!(matches!(err, ArtifactError::Io { .. }));
}
