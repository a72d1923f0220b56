// src/extraction/schema.rs
//
// Schema validation for `yt-dlp --dump-json` output
//
// CRITICAL RULES:
// - Never assume a field's type; check it
// - `id` (non-empty string) and `title` (string) are REQUIRED
// - Everything else degrades to empty/zero
// - Languages come from the keys of the subtitle map, never its values

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::domain::MetadataDocument;
use crate::error::ExtractionError;

/// 2^63, the first value that no longer fits an `i64`.
const MAX_DURATION_SECONDS: f64 = i64::MAX as f64;

/// Validate raw tool output and convert it into a `MetadataDocument`.
///
/// `include_automatic_captions` also merges the keys of
/// `automatic_captions` into the available languages.
pub fn parse_metadata(
    stdout: &[u8],
    include_automatic_captions: bool,
) -> Result<MetadataDocument, ExtractionError> {
    let json: Value = serde_json::from_slice(stdout)
        .map_err(|e| ExtractionError::MalformedOutput(format!("Invalid JSON: {}", e)))?;

    let object = json.as_object().ok_or_else(|| {
        ExtractionError::MalformedOutput("Expected a JSON object at the top level".to_string())
    })?;

    let native_id = required_string(object, "id")?;
    if native_id.trim().is_empty() {
        return Err(ExtractionError::MalformedOutput(
            "Field \"id\" is empty".to_string(),
        ));
    }
    let title = required_string(object, "title")?;

    let owner_name = optional_string(object, "uploader")
        .or_else(|| optional_string(object, "channel"))
        .unwrap_or_default();

    let mut languages = subtitle_keys(object, "subtitles");
    if include_automatic_captions {
        languages.extend(subtitle_keys(object, "automatic_captions"));
    }

    Ok(MetadataDocument {
        native_id,
        title,
        description: optional_string(object, "description").unwrap_or_default(),
        thumbnail_url: optional_string(object, "thumbnail").unwrap_or_default(),
        duration_seconds: duration_seconds(object.get("duration")),
        owner_name,
        available_subtitle_languages: languages.into_iter().collect(),
    })
}

fn required_string(object: &Map<String, Value>, field: &str) -> Result<String, ExtractionError> {
    match object.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(ExtractionError::MalformedOutput(format!(
            "Field {:?} must be a string, got {}",
            field,
            type_name(other)
        ))),
        None => Err(ExtractionError::MalformedOutput(format!(
            "Missing required field {:?}",
            field
        ))),
    }
}

fn optional_string(object: &Map<String, Value>, field: &str) -> Option<String> {
    match object.get(field) {
        Some(Value::String(value)) => Some(value.clone()),
        None | Some(Value::Null) => None,
        Some(other) => {
            log::debug!(
                "[schema] ignoring field {:?} of type {}",
                field,
                type_name(other)
            );
            None
        }
    }
}

/// Whole seconds; fractional values are truncated, anything unusable is 0.
///
/// Values must fit a signed 64-bit store column.
fn duration_seconds(value: Option<&Value>) -> u64 {
    match value.and_then(Value::as_f64) {
        Some(secs) if secs.is_finite() && secs >= 0.0 && secs < MAX_DURATION_SECONDS => {
            secs.trunc() as u64
        }
        Some(secs) => {
            log::debug!("[schema] ignoring out-of-range duration {}", secs);
            0
        }
        None => 0,
    }
}

fn subtitle_keys(object: &Map<String, Value>, field: &str) -> BTreeSet<String> {
    match object.get(field) {
        Some(Value::Object(tracks)) => tracks.keys().cloned().collect(),
        None | Some(Value::Null) => BTreeSet::new(),
        Some(other) => {
            log::debug!(
                "[schema] ignoring {:?} of type {}",
                field,
                type_name(other)
            );
            BTreeSet::new()
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
