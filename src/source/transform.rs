//! Declarative transform engine
//!
//! Reshapes a parsed response body according to a [`TransformSpec`], in
//! order: locate the substructure at `data_path`, drop records failing the
//! filter, then project each record through the field allow-list.
//!
//! An absent path yields an empty result, not an error; a present path of
//! the wrong shape (filter configured but the target is not a sequence) is
//! a transform failure.

use super::types::TransformSpec;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::collections::HashMap;

/// Apply a transform to a parsed response body
pub fn apply_transform(transform: &TransformSpec, body: &JsonValue) -> Result<JsonValue> {
    let target = match &transform.data_path {
        Some(path) => match navigate(body, path) {
            Some(value) => value,
            // Absent path: the upstream simply had nothing for us today
            None => return Ok(JsonValue::Array(Vec::new())),
        },
        None => body,
    };

    match target {
        JsonValue::Array(records) => {
            let mut out: Vec<JsonValue> = Vec::with_capacity(records.len());
            for record in records {
                if let Some(filter) = &transform.filter {
                    if !matches_filter(record, filter) {
                        continue;
                    }
                }
                out.push(match &transform.fields {
                    Some(fields) => project_fields(record, fields),
                    None => record.clone(),
                });
            }
            Ok(JsonValue::Array(out))
        }
        JsonValue::Object(_) => {
            if transform.filter.is_some() {
                return Err(Error::path_type(
                    transform.data_path.as_deref().unwrap_or("."),
                    "sequence",
                    "object",
                ));
            }
            match &transform.fields {
                Some(fields) => Ok(project_fields(target, fields)),
                None => Ok(target.clone()),
            }
        }
        scalar => {
            if transform.filter.is_some() || transform.fields.is_some() {
                return Err(Error::path_type(
                    transform.data_path.as_deref().unwrap_or("."),
                    "sequence",
                    json_type(scalar),
                ));
            }
            Ok(scalar.clone())
        }
    }
}

/// One step of a dot/bracket path
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Parse `list.stations` / `result[0].rows` into segments
fn parse_path(path: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    for token in path.split('.') {
        let (key, rest) = match token.find('[') {
            Some(pos) => (&token[..pos], &token[pos..]),
            None => (token, ""),
        };
        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }
        for part in rest.split('[').filter(|p| !p.is_empty()) {
            if let Some(index) = part.strip_suffix(']').and_then(|n| n.parse().ok()) {
                segments.push(Segment::Index(index));
            }
        }
    }
    segments
}

/// Walk a value along a dot/bracket path; None if any step is absent
fn navigate<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let mut current = value;
    for segment in parse_path(path) {
        current = match segment {
            Segment::Key(key) => current.as_object()?.get(key)?,
            Segment::Index(index) => current.as_array()?.get(index)?,
        };
    }
    Some(current)
}

/// Look up a (possibly dotted) field inside a single record
fn record_field<'a>(record: &'a JsonValue, field: &str) -> Option<&'a JsonValue> {
    navigate(record, field)
}

/// A record matches when every constraint field exists and equals its
/// expected value. A missing field is treated as a non-match.
fn matches_filter(record: &JsonValue, filter: &HashMap<String, JsonValue>) -> bool {
    filter
        .iter()
        .all(|(field, expected)| record_field(record, field) == Some(expected))
}

/// Project a record through the allow-list, renaming kept fields.
/// Fields absent from the record are simply not emitted.
fn project_fields(record: &JsonValue, fields: &HashMap<String, String>) -> JsonValue {
    let mut out = JsonObject::new();
    for (source, renamed) in fields {
        if let Some(value) = record_field(record, source) {
            out.insert(renamed.clone(), value.clone());
        }
    }
    JsonValue::Object(out)
}

/// JSON type name for error messages
fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "sequence",
        JsonValue::Object(_) => "object",
    }
}
