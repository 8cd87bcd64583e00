//! Vocabulary listing

use anyhow::Result;
use diagnosis_lib::DiagnosisPipeline;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_info, print_table, OutputFormat};

#[derive(Tabled, Serialize)]
struct SymptomRow {
    #[tabled(rename = "Symptom")]
    symptom: String,
}

fn symptom_rows(pipeline: &DiagnosisPipeline) -> Vec<SymptomRow> {
    pipeline
        .vocabulary()
        .sorted()
        .into_iter()
        .map(|symptom| SymptomRow {
            symptom: symptom.to_string(),
        })
        .collect()
}

/// List the known symptoms, sorted
pub fn list_symptoms(pipeline: &DiagnosisPipeline, format: OutputFormat) -> Result<()> {
    let rows = symptom_rows(pipeline);
    if let OutputFormat::Table = format {
        print_info(&format!("{} known symptoms", rows.len()));
    }
    print_table(&rows, format)
}
