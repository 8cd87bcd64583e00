//! CLI command implementations

pub mod inspect;
pub mod interactive;
pub mod predict;
pub mod symptoms;

use anyhow::{Context, Result};
use diagnosis_lib::{ArtifactLoader, DiagnosisPipeline};
use tracing::debug;

/// Load and validate both artifacts into a ready pipeline
pub fn load_pipeline(loader: &ArtifactLoader) -> Result<DiagnosisPipeline> {
    debug!(
        model_path = ?loader.model_path(),
        metadata_path = ?loader.metadata_path(),
        "Loading model artifacts"
    );
    let artifacts = loader.load().with_context(|| {
        format!(
            "Failed to load model artifacts from {} and {}",
            loader.model_path().display(),
            loader.metadata_path().display()
        )
    })?;
    Ok(DiagnosisPipeline::new(artifacts))
}

/// Split arguments or an input line on commas, dropping blank entries
pub fn split_symptoms<S: AsRef<str>>(inputs: &[S]) -> Vec<String> {
    inputs
        .iter()
        .flat_map(|input| input.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
