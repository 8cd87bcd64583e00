//! One-shot prediction

use anyhow::{bail, Result};
use colored::Colorize;
use diagnosis_lib::{DiagnosisPipeline, PredictionResult};
use serde::Serialize;
use tabled::Tabled;

use super::split_symptoms;
use crate::output::{
    color_confidence, format_confidence, print_warning, render_json, render_table, warning,
    OutputFormat,
};

/// Row for the ranked disease table
#[derive(Tabled)]
struct RankRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Disease")]
    disease: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

#[derive(Serialize)]
struct RankedPrediction<'a> {
    #[serde(flatten)]
    result: &'a PredictionResult,
    top: Vec<RankedDisease<'a>>,
}

#[derive(Serialize)]
struct RankedDisease<'a> {
    disease: &'a str,
    probability: f32,
}

/// Predict from command line symptoms and print the ranked result
pub fn predict(
    pipeline: &DiagnosisPipeline,
    symptoms: &[String],
    top: usize,
    format: OutputFormat,
) -> Result<()> {
    let symptoms = split_symptoms(symptoms);
    if symptoms.is_empty() {
        bail!("No symptoms given");
    }

    let result = pipeline.predict(symptoms.as_slice())?;
    if result.matched_symptoms.is_empty() {
        print_warning("No valid symptoms found");
        bail!(
            "None of the symptoms matched the vocabulary: {}",
            result.unmatched_symptoms.join(", ")
        );
    }

    println!("{}", render_prediction(&result, top, format)?);
    Ok(())
}

/// Render a prediction with its `top` most probable diseases
pub fn render_prediction(result: &PredictionResult, top: usize, format: OutputFormat) -> Result<String> {
    let ranked = result.top(top);

    if let OutputFormat::Json = format {
        let body = RankedPrediction {
            result,
            top: ranked
                .into_iter()
                .map(|(disease, probability)| RankedDisease { disease, probability })
                .collect(),
        };
        return render_json(&body);
    }

    let rows: Vec<RankRow> = ranked
        .into_iter()
        .enumerate()
        .map(|(i, (disease, probability))| RankRow {
            rank: i + 1,
            disease: disease.to_string(),
            probability: format_confidence(probability),
        })
        .collect();

    let mut lines = vec![
        format!("{} {}", "Predicted disease:".bold(), result.disease.cyan().bold()),
        format!("{} {}", "Confidence:".bold(), color_confidence(result.confidence)),
        format!("{} {}", "Matched symptoms:".bold(), result.matched_symptoms.join(", ")),
    ];
    if !result.unmatched_symptoms.is_empty() {
        lines.push(warning(&format!(
            "Unrecognized symptoms: {}",
            result.unmatched_symptoms.join(", ")
        )));
    }
    lines.push(format!("Top {} possible diseases:", rows.len()));
    lines.push(render_table(&rows));
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;

    #[test]
    fn test_render_table_prediction() {
        colored::control::set_override(false);
        let pipeline = testing::pipeline();
        let result = pipeline.predict(&["Cough", "sneezing"]).unwrap();

        let text = render_prediction(&result, 2, OutputFormat::Table).unwrap();
        assert!(text.contains("Predicted disease: Common Cold"));
        assert!(text.contains("Confidence: 90.00%"));
        assert!(text.contains("Unrecognized symptoms: sneezing"));
        assert!(text.contains("Top 2 possible diseases:"));
    }

    #[test]
    fn test_render_json_prediction() {
        let pipeline = testing::pipeline();
        let result = pipeline.predict(&["headache"]).unwrap();

        let text = render_prediction(&result, 5, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["disease"], "Migraine");
        assert_eq!(value["model_version"], "v1.0.0");
        assert_eq!(value["top"].as_array().unwrap().len(), 3);
        assert_eq!(value["top"][0]["disease"], "Migraine");
    }

    #[test]
    fn test_predict_without_matches_fails() {
        let pipeline = testing::pipeline();
        let err = predict(&pipeline, &["xyz".to_string()], 5, OutputFormat::Table).unwrap_err();
        assert!(err.to_string().contains("xyz"));
    }

    #[test]
    fn test_predict_blank_input_fails() {
        let pipeline = testing::pipeline();
        assert!(predict(&pipeline, &[" , ".to_string()], 5, OutputFormat::Table).is_err());
    }
}
