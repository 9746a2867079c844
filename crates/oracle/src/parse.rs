//! Lenient decoding of oracle answers.
//!
//! Models wrap JSON in code fences, emit scores as strings or floats and
//! occasionally drift from the requested field names. Anything that still
//! carries the essential fields is accepted; everything else is a
//! [`OracleError::MalformedResponse`].
use ingest::{clamp_severity, Priority};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::OracleError;
use crate::types::{ClassificationResult, SimilarityVerdict};

/// Remove a surrounding ```` ```json ```` / ```` ``` ```` fence, if present.
pub fn strip_code_fences(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn parse_object(text: &str) -> Result<Map<String, Value>, OracleError> {
    let cleaned = strip_code_fences(text);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(OracleError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            type_name(&other)
        ))),
        Err(err) => Err(OracleError::MalformedResponse(err.to_string())),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn field<'a>(map: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| map.get(*name)).filter(|v| !v.is_null())
}

/// Integer view of a JSON number or numeric string; floats are rounded.
fn as_integer(value: &Value) -> Option<i64> {
    let float = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            n.as_f64()?
        }
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    float.is_finite().then(|| float.round() as i64)
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Decode a classification answer.
///
/// `category` and a numeric severity are required. Severity is clamped into
/// 1–10; any `priority` or `isEmergency` the model sent is recomputed, and a
/// disagreeing priority label is logged.
pub fn parse_classification(text: &str) -> Result<ClassificationResult, OracleError> {
    let map = parse_object(text)?;

    let category = match field(&map, &["category"]) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => {
            return Err(OracleError::MalformedResponse(
                "missing or empty 'category'".into(),
            ))
        }
    };

    let severity = field(&map, &["severityScore", "severity_score", "severity"])
        .and_then(as_integer)
        .ok_or_else(|| OracleError::MalformedResponse("missing numeric 'severityScore'".into()))?;

    let description = as_text(field(&map, &["description"]));
    let result = ClassificationResult::new(category, clamp_severity(severity), description);

    if let Some(Value::String(label)) = field(&map, &["priority"]) {
        match label.trim().parse::<Priority>() {
            Ok(claimed) if claimed == result.priority => {}
            _ => debug!(
                claimed = %label,
                derived = %result.priority,
                severity = result.severity_score,
                "priority_overridden"
            ),
        }
    }
    Ok(result)
}

/// Decode a comparison answer. `isSame` is required; confidence is clamped
/// into 0–100 and defaults to 0.
pub fn parse_verdict(text: &str) -> Result<SimilarityVerdict, OracleError> {
    let map = parse_object(text)?;

    let is_same = field(&map, &["isSame", "is_same", "same"])
        .and_then(as_bool)
        .ok_or_else(|| OracleError::MalformedResponse("missing boolean 'isSame'".into()))?;

    let confidence = field(&map, &["confidence"])
        .and_then(as_integer)
        .unwrap_or(0)
        .clamp(0, 100) as u8;

    Ok(SimilarityVerdict {
        is_same,
        confidence,
        reason: as_text(field(&map, &["reason"])),
    })
}
