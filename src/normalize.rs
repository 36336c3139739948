//! Turns the model's loosely-typed reply into strict, positionally aligned results.
//!
//! Only two things can fail here: the reply is not JSON, or it is JSON but not an
//! array. Everything below the top level is coerced field by field with a fixed
//! default, so a bad element never fails the batch.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{error, warn};

use crate::error::ReplyError;
use crate::types::{AnalysisResult, Language, Sentiment};

pub const MAX_EMOTIONS: usize = 3;
pub const MAX_KEYWORDS: usize = 5;

/// Field defaults applied when a value is missing or has the wrong type.
pub mod defaults {
    use crate::types::{Language, Sentiment};

    /// Unrecognised labels are read as Neutral, not Error.
    pub const SENTIMENT: Sentiment = Sentiment::Neutral;
    pub const LANGUAGE: Language = Language::Unknown;
    pub const SCORE: f64 = 0.0;
    pub const NON_OBJECT_DETAIL: &str = "parsing error";
    pub const MISSING_DETAIL: &str = "missing result";
}

// Optional language tag after the opening fence, lazy body, closing fence at the very end.
static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(\w*)?\s*\n?(.*?)\n?\s*```$").expect("fence regex"));

/// Strip a surrounding code fence (with or without a language tag).
/// Unfenced text comes back trimmed.
pub fn strip_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    match FENCE_RE.captures(trimmed).and_then(|c| c.get(2)) {
        Some(body) if !body.as_str().is_empty() => body.as_str().trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// Unwrap, parse and coerce a reply for a batch of `expected` inputs.
///
/// The output always has exactly `expected` entries: surplus elements are dropped and
/// missing positions become `Error` results.
pub fn normalize_reply(raw: &str, expected: usize) -> Result<Vec<AnalysisResult>, ReplyError> {
    let unwrapped = strip_fence(raw);

    let parsed: Value = serde_json::from_str(&unwrapped).map_err(|e| {
        error!(error = %e, raw = %raw, unwrapped = %unwrapped, "Model reply is not valid JSON");
        ReplyError::Malformed(e)
    })?;

    let items = match parsed {
        Value::Array(items) => items,
        other => {
            let kind = json_kind(&other);
            error!(kind, reply = %other, "Model reply is not a JSON array");
            return Err(ReplyError::NotAnArray(kind));
        }
    };

    if items.len() != expected {
        warn!(expected, received = items.len(), "Model returned a different number of results");
    }

    let mut results: Vec<AnalysisResult> = items
        .iter()
        .take(expected)
        .enumerate()
        .map(|(index, item)| coerce_element(index, item))
        .collect();
    results.resize_with(expected, || AnalysisResult::error(defaults::MISSING_DETAIL));

    Ok(results)
}

/// Coerce one array element. Never fails.
pub fn coerce_element(index: usize, item: &Value) -> AnalysisResult {
    let Some(object) = item.as_object() else {
        warn!(index, item = %item, "Result element is not an object, marking as error");
        return AnalysisResult::error(defaults::NON_OBJECT_DETAIL);
    };

    let raw_sentiment = object.get("sentiment");
    let sentiment = coerce_sentiment(raw_sentiment).unwrap_or_else(|| {
        warn!(index, value = ?raw_sentiment, "Unexpected sentiment value, defaulting to Neutral");
        defaults::SENTIMENT
    });

    AnalysisResult {
        sentiment,
        score: coerce_score(object.get("score")),
        emotions: coerce_labels(object.get("emotions"), MAX_EMOTIONS),
        keywords: coerce_labels(object.get("keywords"), MAX_KEYWORDS),
        detected_language: coerce_language(object.get("detectedLanguage")),
    }
}

/// Case-insensitive label match. `None` means "use the default".
pub fn coerce_sentiment(value: Option<&Value>) -> Option<Sentiment> {
    match value?.as_str()?.to_lowercase().as_str() {
        "positive" => Some(Sentiment::Positive),
        "negative" => Some(Sentiment::Negative),
        "neutral" => Some(Sentiment::Neutral),
        "error" => Some(Sentiment::Error),
        _ => None,
    }
}

pub fn coerce_language(value: Option<&Value>) -> Language {
    value
        .and_then(Value::as_str)
        .map(Language::from_code)
        .unwrap_or(defaults::LANGUAGE)
}

/// Numbers are clamped to [0, 1]; anything else is the default.
pub fn coerce_score(value: Option<&Value>) -> f64 {
    value
        .and_then(Value::as_f64)
        .map(|s| s.clamp(0.0, 1.0))
        .unwrap_or(defaults::SCORE)
}

/// Arrays are stringified element-wise and capped at `limit`; anything else is empty.
pub fn coerce_labels(value: Option<&Value>, limit: usize) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .take(limit)
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
