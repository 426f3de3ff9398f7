//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, TiffinArgs};
use crate::entity::RecognizedEntity;
use crate::error::Result;
use crate::ml::{ClassificationMetrics, LabelScore};

/// Result structure for training.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingReport {
    pub examples: usize,
    pub labels: Vec<String>,
    pub features: usize,
    pub iterations: usize,
    pub final_loss: f64,
    pub converged: bool,
    pub training_time_ms: u64,
    pub validation: Option<ClassificationMetrics>,
    pub corpus: Option<ClassificationMetrics>,
    pub model_path: String,
}

/// Result structure for prediction.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResult {
    pub text: String,
    pub label: String,
    pub confidence: f64,
    /// Whether the router would dispatch this prediction.
    pub accepted: bool,
    pub scores: Vec<LabelScore>,
}

/// Result structure for entity extraction.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    pub entities: Vec<RecognizedEntity>,
}

/// One exchange of an interactive session.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub reply: String,
    pub understood: bool,
    pub label: Option<String>,
    pub confidence: Option<f64>,
    pub entities: Vec<RecognizedEntity>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &TiffinArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &TiffinArgs) -> Result<()> {
    if args.verbosity() > 1 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    let type_name = std::any::type_name::<T>();

    if type_name.ends_with("PredictionResult") {
        output_prediction_human(&value)
    } else if type_name.ends_with("ExtractionResult") {
        output_extraction_human(&value)
    } else if type_name.ends_with("TrainingReport") {
        output_training_human(&value)
    } else {
        output_generic_human(&value)
    }
}

fn output_prediction_human(value: &serde_json::Value) -> Result<()> {
    let label = value.get("label").map(format_value).unwrap_or_default();
    let confidence = value
        .get("confidence")
        .and_then(|c| c.as_f64())
        .unwrap_or_default();
    let accepted = value
        .get("accepted")
        .and_then(|a| a.as_bool())
        .unwrap_or_default();

    println!(
        "{label} ({confidence:.3}){}",
        if accepted { "" } else { " - below threshold" }
    );
    if let Some(scores) = value.get("scores").and_then(|s| s.as_array()) {
        for score in scores {
            let label = score.get("label").map(format_value).unwrap_or_default();
            let score = score
                .get("score")
                .and_then(|s| s.as_f64())
                .unwrap_or_default();
            println!("  {label:<24} {score:.4}");
        }
    }
    Ok(())
}

fn output_extraction_human(value: &serde_json::Value) -> Result<()> {
    let entities = value
        .get("entities")
        .and_then(|e| e.as_array())
        .cloned()
        .unwrap_or_default();

    if entities.is_empty() {
        println!("No entities found.");
        return Ok(());
    }
    for entity in &entities {
        let entity_type = entity.get("entity_type").map(format_value).unwrap_or_default();
        let entity_value = entity
            .get("entity_value")
            .map(format_value)
            .unwrap_or_default();
        println!("{entity_type}: {entity_value}");
    }
    if let Some(context) = entities[0].get("context") {
        println!("context: {}", format_value(context));
    }
    Ok(())
}

fn output_training_human(value: &serde_json::Value) -> Result<()> {
    let Some(obj) = value.as_object() else {
        return output_generic_human(value);
    };

    println!("Training Summary:");
    println!("─────────────────");
    for key in [
        "examples",
        "labels",
        "features",
        "iterations",
        "final_loss",
        "converged",
        "training_time_ms",
        "model_path",
    ] {
        if let Some(val) = obj.get(key) {
            println!("{key}: {}", format_value(val));
        }
    }

    for (title, key) in [("Validation", "validation"), ("Training corpus", "corpus")] {
        if let Some(metrics) = obj.get(key).and_then(|m| m.as_object()) {
            println!();
            println!("{title}:");
            for field in [
                "examples",
                "micro_accuracy",
                "macro_accuracy",
                "log_loss",
                "log_loss_reduction",
            ] {
                if let Some(val) = metrics.get(field) {
                    println!("  {field}: {}", format_metric(val));
                }
            }
        }
    }
    Ok(())
}

/// Output generic data in human format.
fn output_generic_human(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let formatted_val = format_value(val);
                println!("{key}: {formatted_val}");
            }
        }
        _ => {
            let formatted_value = format_value(value);
            println!("{formatted_value}");
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &TiffinArgs) -> Result<()> {
    println!("{}", to_json(result, args.pretty)?);
    Ok(())
}

/// Serialize a result the way `--format json` prints it.
pub fn to_json<T: Serialize>(result: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    })
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}

/// Format a metric, rounding floats to four places.
fn format_metric(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Number(n) if n.is_f64() => {
            format!("{:.4}", n.as_f64().unwrap_or_default())
        }
        serde_json::Value::Object(obj) => {
            let per_class: BTreeMap<&str, String> = obj
                .iter()
                .map(|(k, v)| (k.as_str(), format_metric(v)))
                .collect();
            format!("{per_class:?}")
        }
        other => format_value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(
            format_value(&serde_json::Value::String("test".to_string())),
            "test"
        );
        assert_eq!(
            format_value(&serde_json::Value::Number(serde_json::Number::from(42))),
            "42"
        );
        assert_eq!(format_value(&serde_json::Value::Bool(false)), "false");
        assert_eq!(format_value(&serde_json::Value::Null), "null");
        assert_eq!(
            format_value(&serde_json::json!(["Greeting", "Order"])),
            "[Greeting, Order]"
        );
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(&serde_json::json!(0.123456)), "0.1235");
        assert_eq!(format_metric(&serde_json::json!(2)), "2");
    }

    #[test]
    fn test_to_json() {
        let result = ExtractionResult {
            text: "order idli".to_string(),
            entities: vec![RecognizedEntity {
                entity_type: "FoodItem".to_string(),
                entity_value: "idli".to_string(),
                context: "[order, idli]-[X, X]".to_string(),
            }],
        };

        let json = to_json(&result, false).unwrap();
        assert!(json.starts_with(r#"{"text":"order idli","entities":[{"entity_type":"FoodItem""#));
        assert!(to_json(&result, true).unwrap().contains('\n'));
    }
}
