//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use diagnosis_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    observability::{DiagnosisMetrics, StructuredLogger},
    DiagnosisPipeline, PredictionError,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DiagnosisPipeline>,
    pub health_registry: HealthRegistry,
    pub metrics: DiagnosisMetrics,
    pub logger: StructuredLogger,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<DiagnosisPipeline>,
        health_registry: HealthRegistry,
        metrics: DiagnosisMetrics,
        api_key: Option<String>,
    ) -> Self {
        Self {
            pipeline,
            health_registry,
            metrics,
            logger: StructuredLogger::new("diagnosis-server"),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SymptomInput {
    pub symptoms: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    unmatched_symptoms: Option<Vec<String>>,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    let body = ErrorBody {
        detail: detail.into(),
        unmatched_symptoms: None,
    };
    (status, Json(body)).into_response()
}

fn error_kind(err: &PredictionError) -> &'static str {
    match err {
        PredictionError::SchemaMismatch { .. } => "schema_mismatch",
        PredictionError::UnknownClassIndex(_) => "unknown_class_index",
        PredictionError::ClassifierOutput(_) => "classifier_output",
        PredictionError::Classifier(_) => "classifier",
    }
}

/// Service summary
async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "diagnosis-server",
        "model_version": state.pipeline.model_version(),
        "symptoms": state.pipeline.vocabulary().len(),
        "diseases": state.pipeline.num_diseases(),
    }))
}

/// Known symptoms, sorted
async fn symptoms(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "symptoms": state.pipeline.vocabulary().sorted() }))
}

/// Predict a disease: 403 on a bad API key, 422 when nothing matched,
/// 500 when the artifacts are inconsistent
async fn predict(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<SymptomInput>,
) -> Response {
    if let Some(expected) = &state.api_key {
        let provided = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            state.logger.log_rejected_request("invalid API key");
            return error_response(StatusCode::FORBIDDEN, "Invalid API key");
        }
    }

    let start = Instant::now();
    let result = state.pipeline.predict(input.symptoms.as_slice());
    state
        .metrics
        .observe_prediction_latency(start.elapsed().as_secs_f64());

    match result {
        Ok(result) => {
            if result.scaling_fallback {
                state.metrics.inc_scaling_fallbacks();
                mark_scaler_degraded(&state).await;
            }
            state.metrics.record_unmatched(result.unmatched_symptoms.len());

            if result.matched_symptoms.is_empty() {
                state.logger.log_no_match(input.symptoms.len());
                let body = ErrorBody {
                    detail: "No valid symptoms found".to_string(),
                    unmatched_symptoms: Some(result.unmatched_symptoms),
                };
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
            }

            state.metrics.record_prediction();
            state.logger.log_prediction(
                &result.disease,
                result.confidence,
                result.matched_symptoms.len(),
                result.unmatched_symptoms.len(),
                &result.model_version,
            );
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            state.metrics.inc_prediction_errors(error_kind(&e));
            state.logger.log_prediction_failure(&e.to_string());
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error making prediction: {}", e),
            )
        }
    }
}

async fn mark_scaler_degraded(state: &AppState) {
    if state.health_registry.status(components::SCALER).await == Some(ComponentStatus::Healthy) {
        state
            .health_registry
            .set_degraded(
                components::SCALER,
                "Scaler does not fit the feature vector, serving unscaled",
            )
            .await;
    }
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = if health.status.is_operational() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/symptoms", get(symptoms))
        .route("/predict", post(predict))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
