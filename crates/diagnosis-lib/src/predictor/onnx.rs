//! ONNX classifier inference using tract
//!
//! Expects a classifier exported with probabilities as a plain tensor
//! (sklearn-onnx `zipmap=False`): output 0 holds the label, output 1 the
//! per-class probabilities. Models with a single output are treated as
//! probability-only and the label is the argmax.

use super::Classifier;
use crate::models::Classification;
use anyhow::{Context, Result};
use std::path::Path;
use tract_onnx::prelude::*;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-backed classifier, optimized for a fixed `[1, n_features]` input
pub struct OnnxClassifier {
    model: TractModel,
    num_features: usize,
}

impl OnnxClassifier {
    /// Build a runnable classifier from model bytes
    pub fn new(model_bytes: &[u8], num_features: usize) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, num_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(Self {
            model,
            num_features,
        })
    }

    pub fn from_path(path: impl AsRef<Path>, num_features: usize) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read model file {:?}", path))?;
        Self::new(&bytes, num_features)
    }

    fn features_to_tensor(&self, features: &[f32]) -> Result<Tensor> {
        let array = tract_ndarray::Array2::from_shape_vec((1, self.num_features), features.to_vec())
            .context("Feature vector does not match model input shape")?;
        Ok(array.into())
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, features: &[f32]) -> Result<Classification> {
        let input = self.features_to_tensor(features)?;
        let outputs = self.model.run(tvec!(input.into()))?;
        classification_from_outputs(&outputs)
    }

    fn num_features(&self) -> Option<usize> {
        Some(self.num_features)
    }
}

/// Decode classifier outputs: `[label, probabilities]`, or probabilities alone
fn classification_from_outputs(outputs: &[TValue]) -> Result<Classification> {
    let probabilities_output = outputs
        .get(1)
        .or_else(|| outputs.first())
        .context("No output from model")?;
    let probabilities: Vec<f32> = probabilities_output
        .cast_to::<f32>()?
        .as_slice::<f32>()?
        .to_vec();

    let class_index = if outputs.len() > 1 {
        let label = outputs[0].cast_to::<i64>()?;
        let label = *label
            .as_slice::<i64>()?
            .first()
            .context("Empty label output")?;
        usize::try_from(label).context("Negative class label")?
    } else {
        probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(idx, _)| idx)
            .context("Empty probability output")?
    };

    Ok(Classification {
        class_index,
        probabilities,
    })
}
