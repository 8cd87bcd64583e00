//! Interactive console session

use anyhow::Result;
use colored::Colorize;
use diagnosis_lib::DiagnosisPipeline;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

use super::predict::render_prediction;
use super::split_symptoms;
use crate::output::{warning, OutputFormat};

const TOP_DISEASES: usize = 5;

/// Run the console loop on stdin and stdout
pub fn interactive(pipeline: &DiagnosisPipeline, format: OutputFormat) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let shown = run_session(pipeline, stdin.lock(), stdout.lock(), format)?;
    debug!(predictions = shown, "Interactive session ended");
    Ok(())
}

/// Prompt for comma-separated symptoms until the user stops or input ends.
/// Returns the number of predictions shown.
pub fn run_session<R: BufRead, W: Write>(
    pipeline: &DiagnosisPipeline,
    mut input: R,
    mut out: W,
    format: OutputFormat,
) -> Result<usize> {
    writeln!(out, "{}", "Disease Prediction System".bold())?;
    writeln!(
        out,
        "{} symptoms known, model {}",
        pipeline.vocabulary().len(),
        pipeline.model_version()
    )?;

    let mut shown = 0;
    loop {
        write!(out, "\nEnter your symptoms, separated by commas: ")?;
        out.flush()?;
        let Some(line) = read_line(&mut input)? else {
            break;
        };

        let symptoms = split_symptoms(&[line]);
        if symptoms.is_empty() {
            writeln!(out, "{}", warning("No symptoms entered"))?;
        } else {
            match pipeline.predict(symptoms.as_slice()) {
                Ok(result) if result.matched_symptoms.is_empty() => {
                    writeln!(out, "{}", warning("No valid symptoms found"))?;
                    writeln!(out, "Unrecognized: {}", result.unmatched_symptoms.join(", "))?;
                    writeln!(out, "Run `dx symptoms` to list the known symptoms")?;
                }
                Ok(result) => {
                    writeln!(out, "{}", render_prediction(&result, TOP_DISEASES, format)?)?;
                    shown += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Prediction failed");
                    writeln!(out, "{} {}", "Error making prediction:".red().bold(), e)?;
                }
            }
        }

        write!(out, "\nPredict again? (yes/no): ")?;
        out.flush()?;
        match read_line(&mut input)? {
            Some(answer) if is_yes(&answer) => continue,
            _ => break,
        }
    }

    writeln!(out, "Goodbye")?;
    Ok(shown)
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "y" | "yes")
}
