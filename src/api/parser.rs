// src/api/parser.rs
//! Response normalization: untyped JSON bodies in, strict shapes out.
//!
//! Every function here is pure apart from reporting diagnostics. Listing
//! quirks degrade to empty results; only a detail body without an
//! `object` is treated as malformed, because nothing downstream could use it.

use super::types::{FetchOutcome, ObjectDetail, ObjectPage, SkipReason, SpaceEntry};
use crate::constants::{UNKNOWN_OBJECT_TYPE, UNTITLED_OBJECT_NAME};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::LoaderError;
use crate::model::{ExtractedProperties, KnownProperty, Record, RecordMetadata};
use crate::types::{ObjectId, SpaceId};
use serde_json::Value;

/// Formats whose value is copied through for scalar properties.
const SCALAR_FORMATS: [&str; 2] = ["date", "text"];

/// Parses `{"data": [{"id", "name"}, ...]}` from the space listing.
pub fn parse_spaces_response(body: &Value, sink: &dyn DiagnosticSink) -> Vec<SpaceEntry> {
    let Some(entries) = body.get("data").and_then(Value::as_array) else {
        sink.emit(Diagnostic::UnexpectedSpacesShape);
        return Vec::new();
    };

    entries
        .iter()
        .filter(|entry| entry.is_object())
        .map(|entry| SpaceEntry {
            id: entry.get("id").and_then(non_empty_string),
            name: entry.get("name").and_then(Value::as_str).map(str::to_string),
        })
        .collect()
}

/// Parses one page of `{"data": [{"id"}, ...], "pagination": {"has_more"}}`.
pub fn parse_objects_page(
    body: &Value,
    space_id: &SpaceId,
    sink: &dyn DiagnosticSink,
) -> ObjectPage {
    let Some(entries) = body.get("data").and_then(Value::as_array) else {
        sink.emit(Diagnostic::UnexpectedListShape {
            space_id: space_id.clone(),
        });
        return ObjectPage::default();
    };

    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.get("id").and_then(non_empty_string) {
            Some(id) => ids.push(ObjectId::from_trusted(id)),
            None => sink.emit(Diagnostic::ObjectWithoutId {
                space_id: space_id.clone(),
            }),
        }
    }

    let has_more = body
        .get("pagination")
        .filter(|p| p.is_object())
        .and_then(|p| p.get("has_more"))
        .is_some_and(is_truthy);

    ObjectPage {
        ids,
        returned: entries.len(),
        has_more,
    }
}

/// Validates `{"object": {...}}` from the object detail endpoint.
pub fn parse_object_detail(
    body: &Value,
    object_id: &ObjectId,
) -> Result<ObjectDetail, LoaderError> {
    let object = body
        .get("object")
        .and_then(Value::as_object)
        .ok_or_else(|| LoaderError::MalformedResponse {
            context: format!("object {}", object_id),
            reason: format!("expected an \"object\" map, got {}", preview(body)),
        })?;

    Ok(ObjectDetail {
        markdown: object
            .get("markdown")
            .and_then(Value::as_str)
            .map(str::to_string),
        name: object.get("name").and_then(Value::as_str).map(str::to_string),
        archived: object.get("archived").is_some_and(is_truthy),
        type_name: object
            .get("type")
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        properties: object.get("properties").cloned(),
    })
}

/// Projects the allow-listed properties into metadata values.
///
/// Unknown keys, unsupported formats and malformed entries are dropped;
/// this never fails.
pub fn extract_properties(properties: Option<&Value>) -> ExtractedProperties {
    let mut extracted = ExtractedProperties::default();
    let Some(properties) = properties.and_then(Value::as_array) else {
        return extracted;
    };

    for prop in properties {
        let Some(known) = prop
            .get("key")
            .and_then(Value::as_str)
            .and_then(KnownProperty::from_key)
        else {
            continue;
        };

        if known == KnownProperty::Tag {
            let Some(items) = prop.get("multi_select").and_then(Value::as_array) else {
                continue;
            };
            let names: Vec<String> = items
                .iter()
                .filter_map(|tag| tag.get("name"))
                .filter_map(non_empty_string)
                .collect();
            if !names.is_empty() {
                extracted.tags = Some(names);
            }
            continue;
        }

        let Some(format) = prop
            .get("format")
            .and_then(Value::as_str)
            .filter(|f| SCALAR_FORMATS.contains(f))
        else {
            // e.g. "objects" relations are not projected
            continue;
        };

        if let Some(value) = prop.get(format).and_then(Value::as_str) {
            extracted.set_text(known, value.to_string());
        }
    }

    extracted
}

/// Turns a validated detail into a record, or a skip when there is no markdown.
pub fn normalize_object(
    space_id: &SpaceId,
    space_name: &str,
    object_id: &ObjectId,
    detail: ObjectDetail,
    sink: &dyn DiagnosticSink,
) -> FetchOutcome {
    let Some(markdown) = detail.markdown else {
        sink.emit(Diagnostic::MissingMarkdown {
            object_id: object_id.clone(),
        });
        return FetchOutcome::Skipped {
            object_id: object_id.clone(),
            reason: SkipReason::MissingMarkdown,
        };
    };

    let object_type = detail.type_name.unwrap_or_else(|| {
        sink.emit(Diagnostic::MissingType {
            object_id: object_id.clone(),
        });
        UNKNOWN_OBJECT_TYPE.to_string()
    });

    let name = match detail.name {
        Some(name) if !name.is_empty() => name,
        Some(_) => UNTITLED_OBJECT_NAME.to_string(),
        None => {
            sink.emit(Diagnostic::MissingName {
                object_id: object_id.clone(),
            });
            UNTITLED_OBJECT_NAME.to_string()
        }
    };

    let properties = extract_properties(detail.properties.as_ref());

    FetchOutcome::Emitted(Box::new(Record {
        content: markdown,
        metadata: RecordMetadata {
            space_id: space_id.clone(),
            space_name: space_name.to_string(),
            object_id: object_id.clone(),
            id: object_id.clone(),
            name,
            archived: detail.archived,
            object_type,
            properties,
        },
    }))
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Accepts non-empty strings and numbers as identifiers.
fn non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn preview(body: &Value) -> String {
    let text = body.to_string();
    text.chars()
        .take(crate::constants::ERROR_BODY_PREVIEW_LENGTH)
        .collect()
}
