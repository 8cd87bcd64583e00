//! Fitted standard scaler applied before classification

use crate::error::ScalingError;
use serde::{Deserialize, Serialize};

/// Per-feature standardization `(x - mean) / scale` fitted at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f32>, scale: Vec<f32>) -> Self {
        Self { mean, scale }
    }

    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Scale a feature vector. A zero scale leaves the centered value as is,
    /// matching how a constant feature is handled when fitted.
    pub fn transform(&self, values: &[f32]) -> Result<Vec<f32>, ScalingError> {
        if values.len() != self.mean.len() || values.len() != self.scale.len() {
            return Err(ScalingError::DimensionMismatch {
                expected: self.mean.len(),
                actual: values.len(),
            });
        }
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let centered = x - mean;
                if *scale == 0.0 {
                    centered
                } else {
                    centered / scale
                }
            })
            .collect())
    }
}
