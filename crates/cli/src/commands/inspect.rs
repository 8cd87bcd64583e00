//! Artifact summary

use anyhow::Result;
use diagnosis_lib::artifacts::compute_checksum;
use diagnosis_lib::{ArtifactLoader, ModelMetadata};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_error, print_success, print_table, render_json, OutputFormat};

#[derive(Debug, Serialize)]
struct InspectReport {
    model_path: String,
    metadata_path: String,
    model_version: String,
    features: usize,
    symptoms: usize,
    diseases: usize,
    scaler: bool,
    expected_sha256: Option<String>,
    actual_sha256: Option<String>,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Tabled, Serialize)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn build_report(loader: &ArtifactLoader, metadata: &ModelMetadata) -> InspectReport {
    let actual_sha256 = std::fs::read(loader.model_path())
        .ok()
        .map(|bytes| compute_checksum(&bytes));
    let error = loader.load().err().map(|e| format!("{:#}", anyhow::Error::new(e)));

    InspectReport {
        model_path: loader.model_path().display().to_string(),
        metadata_path: loader.metadata_path().display().to_string(),
        model_version: metadata.model_version.clone(),
        features: metadata.feature_cols.len(),
        symptoms: metadata.unique_symptoms.len(),
        diseases: metadata.disease_mapping.len(),
        scaler: metadata.scaler.is_some(),
        expected_sha256: metadata.model_sha256.clone(),
        actual_sha256,
        valid: error.is_none(),
        error,
    }
}

fn report_rows(report: &InspectReport) -> Vec<FieldRow> {
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    vec![
        FieldRow { field: "Model", value: report.model_path.clone() },
        FieldRow { field: "Metadata", value: report.metadata_path.clone() },
        FieldRow { field: "Model version", value: report.model_version.clone() },
        FieldRow { field: "Features", value: report.features.to_string() },
        FieldRow { field: "Symptoms", value: report.symptoms.to_string() },
        FieldRow { field: "Diseases", value: report.diseases.to_string() },
        FieldRow { field: "Scaler", value: if report.scaler { "yes" } else { "no" }.to_string() },
        FieldRow { field: "Expected SHA-256", value: or_dash(&report.expected_sha256) },
        FieldRow { field: "Actual SHA-256", value: or_dash(&report.actual_sha256) },
    ]
}

/// Summarise the metadata and check that both artifacts load together
pub fn inspect(loader: &ArtifactLoader, format: OutputFormat) -> Result<()> {
    let metadata = loader.read_metadata()?;
    let report = build_report(loader, &metadata);

    match format {
        OutputFormat::Json => println!("{}", render_json(&report)?),
        OutputFormat::Table => {
            print_table(&report_rows(&report), format)?;
            match &report.error {
                None => print_success("Artifacts are consistent"),
                Some(error) => print_error(error),
            }
        }
    }

    if !report.valid {
        anyhow::bail!("Model artifacts failed validation");
    }
    Ok(())
}
