//! Observability infrastructure for the diagnosis service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcomes, scaling fallbacks, model version)
//! - Structured logging of service events with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DiagnosisMetricsInner> = OnceLock::new();

struct DiagnosisMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions: IntCounter,
    prediction_errors: IntCounterVec,
    unmatched_symptoms: IntCounter,
    scaling_fallbacks: IntCounter,
    model_version_info: GaugeVec,
}

impl DiagnosisMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "diagnosis_prediction_latency_seconds",
                "Time spent encoding symptoms and running the classifier",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions: register_int_counter!(
                "diagnosis_predictions_total",
                "Total number of predictions returned"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors: register_int_counter_vec!(
                "diagnosis_prediction_errors_total",
                "Total number of failed predictions by error kind",
                &["kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            unmatched_symptoms: register_int_counter!(
                "diagnosis_unmatched_symptoms_total",
                "Total number of submitted symptoms with no vocabulary match"
            )
            .expect("Failed to register unmatched_symptoms_total"),

            scaling_fallbacks: register_int_counter!(
                "diagnosis_scaling_fallbacks_total",
                "Predictions made on unscaled features after a scaler failure"
            )
            .expect("Failed to register scaling_fallbacks_total"),

            model_version_info: register_gauge_vec!(
                "diagnosis_model_version_info",
                "Information about the currently loaded model",
                &["version"]
            )
            .expect("Failed to register model_version_info"),
        }
    }
}

/// Handle to the process-wide Prometheus metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct DiagnosisMetrics {
    _private: (),
}

impl Default for DiagnosisMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DiagnosisMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DiagnosisMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn record_prediction(&self) {
        self.inner().predictions.inc();
    }

    /// Count submitted symptoms that matched no vocabulary entry
    pub fn record_unmatched(&self, unmatched: usize) {
        self.inner().unmatched_symptoms.inc_by(unmatched as u64);
    }

    pub fn inc_prediction_errors(&self, kind: &str) {
        self.inner()
            .prediction_errors
            .with_label_values(&[kind])
            .inc();
    }

    pub fn inc_scaling_fallbacks(&self) {
        self.inner().scaling_fallbacks.inc();
    }

    pub fn set_model_version(&self, version: &str) {
        self.inner().model_version_info.reset();
        self.inner()
            .model_version_info
            .with_label_values(&[version])
            .set(1.0);
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_prediction(
        &self,
        disease: &str,
        confidence: f32,
        matched: usize,
        unmatched: usize,
        model_version: &str,
    ) {
        info!(
            event = "prediction_generated",
            service = %self.service,
            disease = %disease,
            confidence = confidence,
            matched_symptoms = matched,
            unmatched_symptoms = unmatched,
            model_version = %model_version,
            "Generated disease prediction"
        );
    }

    /// Log a prediction with no recognizable symptom
    pub fn log_no_match(&self, submitted: usize) {
        info!(
            event = "prediction_skipped",
            service = %self.service,
            submitted_symptoms = submitted,
            "No submitted symptom matched the vocabulary"
        );
    }

    pub fn log_prediction_failure(&self, error: &str) {
        warn!(
            event = "prediction_failed",
            service = %self.service,
            error = %error,
            "Prediction aborted"
        );
    }

    pub fn log_rejected_request(&self, reason: &str) {
        warn!(
            event = "request_rejected",
            service = %self.service,
            reason = %reason,
            "Request rejected"
        );
    }

    pub fn log_startup(&self, version: &str, model_version: &str, symptoms: usize, diseases: usize) {
        info!(
            event = "service_started",
            service = %self.service,
            service_version = %version,
            model_version = %model_version,
            symptoms = symptoms,
            diseases = diseases,
            "Diagnosis service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Diagnosis service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handles_share_state() {
        let metrics = DiagnosisMetrics::new();
        metrics.observe_prediction_latency(0.002);
        metrics.record_prediction();
        metrics.inc_prediction_errors("schema_mismatch");
        metrics.set_model_version("v1.0.0");

        let before = metrics.inner().unmatched_symptoms.get();
        let other = metrics.clone();
        other.record_unmatched(2);
        assert!(metrics.inner().unmatched_symptoms.get() >= before + 2);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("diagnosis-server");
        assert_eq!(logger.service, "diagnosis-server");
    }
}
