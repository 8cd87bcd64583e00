//! Symptom diagnosis library
//!
//! This crate provides the core functionality for:
//! - Symptom normalization and vocabulary matching
//! - Feature vector assembly in the classifier's schema order
//! - ONNX classifier inference and result composition
//! - Model artifact loading and validation
//! - Health checks and observability

pub mod artifacts;
pub mod encoding;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

pub use artifacts::{ArtifactLoader, ModelArtifacts, ModelMetadata};
pub use error::{ArtifactError, PredictionError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{DiagnosisMetrics, StructuredLogger};
pub use predictor::{Classifier, DiagnosisPipeline};
