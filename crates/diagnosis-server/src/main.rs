//! Diagnosis Server - disease prediction over HTTP
//!
//! Loads the classifier and metadata artifacts once at startup and serves
//! predictions, symptom listings, health checks and Prometheus metrics.

use anyhow::{Context, Result};
use diagnosis_lib::{
    health::{components, HealthRegistry},
    observability::{DiagnosisMetrics, StructuredLogger},
    ArtifactLoader, DiagnosisPipeline,
};
use diagnosis_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting diagnosis-server");

    let config = ServerConfig::load()?;
    info!(
        model_path = ?config.model_path,
        metadata_path = ?config.metadata_path,
        api_key_required = config.api_key.is_some(),
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::METADATA).await;
    health_registry.register(components::CLASSIFIER).await;

    // Artifacts load once, outside the request path; a bad bundle stops startup
    let loader = ArtifactLoader::new(&config.model_path, &config.metadata_path);
    let artifacts = loader
        .load()
        .inspect_err(|e| error!(error = %e, "Failed to load model artifacts"))
        .context("Model artifacts could not be loaded")?;
    let pipeline = Arc::new(DiagnosisPipeline::new(artifacts));
    if pipeline.has_scaler() {
        health_registry.register(components::SCALER).await;
    }

    let metrics = DiagnosisMetrics::new();
    metrics.set_model_version(pipeline.model_version());

    let logger = StructuredLogger::new("diagnosis-server");
    logger.log_startup(
        SERVER_VERSION,
        pipeline.model_version(),
        pipeline.vocabulary().len(),
        pipeline.num_diseases(),
    );

    let app_state = Arc::new(api::AppState::new(
        pipeline,
        health_registry.clone(),
        metrics,
        config.api_key.clone(),
    ));

    health_registry.set_ready(true).await;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
    };
    api::serve(config.api_port, app_state.clone(), shutdown).await?;

    let stats = app_state.pipeline.stats();
    info!(
        total_inferences = stats.total_inferences,
        slow_inferences = stats.slow_inferences,
        scaling_fallbacks = stats.scaling_fallbacks,
        "Inference totals"
    );
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
