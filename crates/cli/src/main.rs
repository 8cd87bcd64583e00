//! Symptom Diagnosis CLI
//!
//! A command-line tool for predicting diseases from symptoms, browsing the
//! symptom vocabulary, and inspecting model artifacts.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{inspect, interactive, predict, symptoms};
use diagnosis_lib::ArtifactLoader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Symptom Diagnosis CLI
#[derive(Parser)]
#[command(name = "dx")]
#[command(author, version, about = "CLI for Symptom Diagnosis", long_about = None)]
pub struct Cli {
    /// Path to the ONNX classifier (can also be set via DX_MODEL env var)
    #[arg(long, env = "DX_MODEL")]
    pub model: Option<PathBuf>,

    /// Path to the model metadata JSON (can also be set via DX_METADATA env var)
    #[arg(long, env = "DX_METADATA")]
    pub metadata: Option<PathBuf>,

    /// Output format [default: table]
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict a disease from symptoms
    Predict {
        /// Symptoms, as separate arguments or comma-separated
        #[arg(required = true)]
        symptoms: Vec<String>,

        /// Number of most probable diseases to show
        #[arg(long, default_value_t = 5)]
        top: usize,
    },

    /// Enter symptoms interactively
    Interactive,

    /// List the known symptoms
    Symptoms,

    /// Summarise and validate the model artifacts
    Inspect,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::Config::load()?;
    let format = config.format(cli.format)?;
    let loader = ArtifactLoader::new(
        config.model_path(cli.model),
        config.metadata_path(cli.metadata),
    );

    // Execute command
    match cli.command {
        Commands::Predict { symptoms, top } => {
            let pipeline = commands::load_pipeline(&loader)?;
            predict::predict(&pipeline, &symptoms, top, format)?;
        }
        Commands::Interactive => {
            let pipeline = commands::load_pipeline(&loader)?;
            interactive::interactive(&pipeline, format)?;
        }
        Commands::Symptoms => {
            let pipeline = commands::load_pipeline(&loader)?;
            symptoms::list_symptoms(&pipeline, format)?;
        }
        Commands::Inspect => {
            inspect::inspect(&loader, format)?;
        }
    }

    Ok(())
}
