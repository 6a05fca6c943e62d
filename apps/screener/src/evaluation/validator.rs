//! The one gate between free-text model replies and typed data.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::scores::check_score;
use crate::models::{Dimension, DimensionAnalysis, DimensionScores};

/// A validated evaluation reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub scores: DimensionScores,
    pub analysis: DimensionAnalysis,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub critical_analysis: Option<String>,
}

/// Removes a leading ```` ``` ```` / ```` ```json ```` fence and its closing
/// counterpart. Text without fences is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Language tag, e.g. `json` or `JSON`.
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let rest = rest.trim_start();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}

/// Parses a fenced or unfenced JSON reply.
pub fn parse_json_reply(reply: &str) -> Result<Value, AppError> {
    serde_json::from_str(strip_code_fences(reply))
        .map_err(|e| AppError::ResponseFormat(format!("reply is not valid JSON: {e}")))
}

/// Validates an evaluation reply: four scores in [0, 10], one analysis string
/// per dimension, and the optional extended fields when present.
pub fn validate_evaluation(reply: &str) -> Result<AnalysisResult, AppError> {
    let value = parse_json_reply(reply)?;
    let obj = value
        .as_object()
        .ok_or_else(|| AppError::ResponseFormat("expected a JSON object".to_string()))?;

    let mut raw = [0.0; 4];
    for (slot, dimension) in raw.iter_mut().zip(Dimension::ALL) {
        *slot = score_field(obj, dimension)?;
    }
    let scores = DimensionScores::new(raw[0], raw[1], raw[2], raw[3])?;

    let analysis_obj = obj
        .get("analysis")
        .and_then(Value::as_object)
        .ok_or_else(|| AppError::ResponseFormat("missing 'analysis' object".to_string()))?;
    let mut analysis = DimensionAnalysis::default();
    for dimension in Dimension::ALL {
        let text = analysis_obj
            .get(dimension.key())
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::ResponseFormat(format!("missing analysis text for '{dimension}'"))
            })?;
        analysis.set(dimension, text.to_string());
    }

    Ok(AnalysisResult {
        scores,
        analysis,
        strengths: string_list(obj, "strengths")?,
        weaknesses: string_list(obj, "weaknesses")?,
        critical_analysis: optional_string(obj, "criticalAnalysis")?,
    })
}

fn score_field(obj: &Map<String, Value>, dimension: Dimension) -> Result<f64, AppError> {
    match obj.get(dimension.key()) {
        Some(Value::Number(n)) => {
            let value = n
                .as_f64()
                .ok_or_else(|| AppError::score_range(dimension, n))?;
            Ok(check_score(dimension, value)?)
        }
        Some(other) => Err(AppError::score_range(dimension, other)),
        None => Err(AppError::score_range(dimension, "missing")),
    }
}

fn string_list(obj: &Map<String, Value>, field: &str) -> Result<Vec<String>, AppError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    AppError::ResponseFormat(format!("'{field}' must contain only strings"))
                })
            })
            .collect(),
        Some(_) => Err(AppError::ResponseFormat(format!(
            "'{field}' must be an array of strings"
        ))),
    }
}

fn optional_string(obj: &Map<String, Value>, field: &str) -> Result<Option<String>, AppError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(AppError::ResponseFormat(format!("'{field}' must be a string"))),
    }
}
