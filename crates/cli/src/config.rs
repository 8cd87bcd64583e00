//! Configuration management for the CLI

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

const DEFAULT_MODEL_PATH: &str = "disease_prediction_model.onnx";
const DEFAULT_METADATA_PATH: &str = "model_metadata.json";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Classifier artifact used when `--model` is not given
    pub model_path: Option<PathBuf>,
    /// Metadata artifact used when `--metadata` is not given
    pub metadata_path: Option<PathBuf>,
    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from `~/.config/dx/config.json`, defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("dx").join("config.json"))
    }

    /// Command line flag, then config file, then the working-directory default
    pub fn model_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.model_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
    }

    pub fn metadata_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.metadata_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_METADATA_PATH))
    }

    pub fn format(&self, flag: Option<OutputFormat>) -> Result<OutputFormat> {
        if let Some(format) = flag {
            return Ok(format);
        }
        match &self.default_format {
            Some(name) => OutputFormat::from_str(name, true)
                .map_err(|_| anyhow::anyhow!("Unknown default_format {:?} in config file", name)),
            None => Ok(OutputFormat::default()),
        }
    }
}
