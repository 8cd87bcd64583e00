//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Optional configuration file, looked up in the working directory
const CONFIG_FILE: &str = "diagnosis-server";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Exported ONNX classifier
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Metadata artifact written alongside the classifier
    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Required `x-api-key` value for `/predict`; open when unset
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("disease_prediction_model.onnx")
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("model_metadata.json")
}

fn default_api_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            metadata_path: default_metadata_path(),
            api_port: default_api_port(),
            api_key: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `diagnosis-server.{toml,json,yaml}` and
    /// `DIAGNOSIS_*` environment variables, the latter taking precedence
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix("DIAGNOSIS"))
            .build()
            .context("Failed to read server configuration")?;

        config
            .try_deserialize()
            .context("Invalid server configuration")
    }
}
