//! Recovering typed values from free-form model output.
//!
//! Model replies are expected to contain one JSON object, possibly wrapped in
//! a fenced code block or surrounded by prose. Parsing is:
//! extract → JSON → required-field check → typed deserialization. Every stage
//! fails with a [`ParseError`].

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Why a model reply could not be turned into a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("model response contained no text")]
    NoText,

    #[error("model response did not contain a JSON object")]
    NoJson,

    #[error("model response was not valid JSON: {0}")]
    Json(String),

    #[error("model response is missing required field `{0}`")]
    MissingField(String),

    #[error("model response is invalid: {0}")]
    Invalid(String),
}

/// Isolates the JSON object inside a model reply.
///
/// Strips a leading fence (with optional language tag) and a trailing fence,
/// then slices from the first `{` to the last `}`. The fence may share a line
/// with the JSON.
#[must_use]
pub fn extract_json(text: &str) -> Option<&str> {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        body = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start <= end).then(|| &body[start..=end])
}

/// Parses a model reply into `T` after checking `required` field paths.
///
/// Paths are dotted (`action.range`); a `[]` suffix applies the rest of the
/// path to every element of an array (`recommendations[].id`).
///
/// # Errors
///
/// Returns [`ParseError`] when no JSON object is present, the JSON is
/// malformed, a required field is missing, or the value does not match `T`.
pub fn parse_model_json<T: DeserializeOwned>(
    text: &str,
    required: &[&str],
) -> Result<T, ParseError> {
    let json = extract_json(text).ok_or(ParseError::NoJson)?;
    let value: JsonValue =
        serde_json::from_str(json).map_err(|e| ParseError::Json(e.to_string()))?;

    for path in required {
        check_path(&value, path, path)?;
    }

    serde_json::from_value(value).map_err(|e| ParseError::Invalid(e.to_string()))
}

fn check_path(value: &JsonValue, path: &str, full: &str) -> Result<(), ParseError> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let (key, each) = match head.strip_suffix("[]") {
        Some(key) => (key, true),
        None => (head, false),
    };

    let field = value
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ParseError::MissingField(full.to_string()))?;

    if each {
        let items = field
            .as_array()
            .ok_or_else(|| ParseError::Invalid(format!("`{key}` must be an array")))?;
        if let Some(rest) = rest {
            for item in items {
                check_path(item, rest, full)?;
            }
        }
        return Ok(());
    }

    match rest {
        Some(rest) => check_path(field, rest, full),
        None => Ok(()),
    }
}
