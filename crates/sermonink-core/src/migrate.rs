//! Normalisation of persisted and imported notes.
//!
//! Stored notes predate pagination: older records hold a single string in
//! `content` and `drawingData`. Every note is therefore parsed permissively
//! into JSON values first and then normalised into the strict [`Note`] shape.

use crate::note::{Note, NoteStyles, ServiceType};
use crate::pages::PageStore;
use chrono::{Local, NaiveDate};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Why a payload could not be turned into notes.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Expected an array of notes")]
    NotAnArray,
    #[error("The backup contains no notes")]
    Empty,
    #[error("Note {index} is not an object")]
    NotAnObject { index: usize },
    #[error("Note {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },
}

/// Check the shape an imported backup must have before it may replace the
/// collection: an array whose first element has an id and a title.
pub fn validate_backup(value: &Value) -> Result<&Vec<Value>, ValidationError> {
    let Value::Array(items) = value else {
        return Err(ValidationError::NotAnArray);
    };
    let first = items.first().ok_or(ValidationError::Empty)?;
    let Value::Object(fields) = first else {
        return Err(ValidationError::NotAnObject { index: 0 });
    };
    for field in ["id", "title"] {
        if fields.get(field).is_none_or(Value::is_null) {
            return Err(ValidationError::MissingField { index: 0, field });
        }
    }
    Ok(items)
}

/// Normalise every note in a stored or imported array.
///
/// Elements that are not objects are dropped with a warning; the rest are
/// migrated individually.
pub fn migrate_notes(items: &[Value]) -> Vec<Note> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match migrate_note(item) {
            Ok(note) => Some(note),
            Err(e) => {
                log::warn!("Dropping note {}: {}", index, e);
                None
            }
        })
        .collect()
}

/// Normalise one note record.
pub fn migrate_note(value: &Value) -> Result<Note, ValidationError> {
    let Value::Object(fields) = value else {
        return Err(ValidationError::NotAnObject { index: 0 });
    };
    let field = |name: &str| fields.get(name).unwrap_or(&Value::Null);

    let id = match field("id") {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => {
            let id = Uuid::new_v4().to_string();
            log::warn!("Note without an id; assigned {}", id);
            id
        }
    };

    let content = string_sequence(field("content"));
    let drawing = string_sequence(field("drawingData"));
    if field("content").is_string() || field("drawingData").is_string() {
        log::debug!("Migrating single-page note {} to paged layout", id);
    }

    let styles = match field("styles") {
        Value::Object(_) => serde_json::from_value::<NoteStyles>(field("styles").clone()).unwrap_or_else(|e| {
            log::warn!("Note {} has unreadable styles ({}); using defaults", id, e);
            NoteStyles::default()
        }),
        _ => NoteStyles::default(),
    };

    let service_type = match field("serviceType") {
        Value::String(label) => ServiceType::from_label(label).unwrap_or_else(|| {
            log::warn!("Note {} has unknown service type {:?}", id, label);
            ServiceType::default()
        }),
        _ => ServiceType::default(),
    };

    Ok(Note {
        title: text(field("title")),
        date: parse_date(field("date"), &id),
        service_type,
        passage: text(field("passage")),
        pages: PageStore::from_parts(content, drawing),
        styles,
        id,
    })
}

/// A string becomes a one-element sequence; arrays keep their order.
fn string_sequence(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().map(text_or_json).collect(),
        other => vec![other.to_string()],
    }
}

/// Strings as is, nulls as empty, structured values as their JSON text.
fn text_or_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(value: &Value, id: &str) -> NaiveDate {
    let parsed = value
        .as_str()
        .and_then(|s| s.get(..10))
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok());
    parsed.unwrap_or_else(|| {
        log::warn!("Note {} has no readable date ({}); using today", id, value);
        Local::now().date_naive()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::FontWeight;
    use serde_json::json;

    #[test]
    fn test_legacy_single_string_note() {
        let legacy = json!({
            "id": 1700000000000u64,
            "title": "Old note",
            "date": "2023-11-14",
            "serviceType": "Sunday Evening",
            "passage": "John 3:16",
            "content": "<div>Legacy body</div>",
            "drawingData": "[{\"points\":[{\"x\":1,\"y\":1},{\"x\":2,\"y\":2}],\"color\":\"#000\",\"thickness\":2}]"
        });

        let note = migrate_note(&legacy).unwrap();
        assert_eq!(note.id, "1700000000000");
        assert_eq!(note.pages.content(), &["<div>Legacy body</div>".to_string()]);
        assert_eq!(note.pages.drawing_data().len(), 1);
        assert!(note.pages.drawing_data()[0].starts_with('['));
        assert_eq!(note.service_type, ServiceType::SundayEvening);
        assert_eq!(note.date, NaiveDate::from_ymd_opt(2023, 11, 14).unwrap());
        assert_eq!(note.styles, NoteStyles::default());
    }

    #[test]
    fn test_string_content_with_missing_drawing() {
        let note = migrate_note(&json!({"id": "a", "title": "t", "content": "body"})).unwrap();
        assert_eq!(note.pages.page_count(), 1);
        assert_eq!(note.pages.drawing_data(), &["".to_string()]);
    }

    #[test]
    fn test_drawing_reconciled_to_content_length() {
        let note = migrate_note(&json!({
            "id": "a",
            "title": "t",
            "content": ["one", "two", "three"],
            "drawingData": ["d1"]
        }))
        .unwrap();
        assert_eq!(note.pages.drawing_data(), &["d1".to_string(), String::new(), String::new()]);

        let note = migrate_note(&json!({
            "id": "a",
            "title": "t",
            "content": "one",
            "drawingData": ["d1", "d2"]
        }))
        .unwrap();
        assert_eq!(note.pages.drawing_data(), &["d1".to_string()]);
    }

    #[test]
    fn test_structured_drawing_becomes_json_text() {
        let note = migrate_note(&json!({
            "id": "a",
            "title": "t",
            "content": ["one"],
            "drawingData": [[{"points": [], "color": "#000", "thickness": 1}]]
        }))
        .unwrap();
        let strokes = crate::stroke::deserialize_strokes(&note.pages.drawing_data()[0]);
        assert_eq!(strokes.len(), 1);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let note = migrate_note(&json!({})).unwrap();
        assert!(!note.id.is_empty());
        assert_eq!(note.title, "");
        assert_eq!(note.pages.page_count(), 1);
        assert_eq!(note.date, Local::now().date_naive());
    }

    #[test]
    fn test_datetime_and_styles() {
        let note = migrate_note(&json!({
            "id": "a",
            "title": "t",
            "date": "2024-01-07T09:30:00.000Z",
            "serviceType": "Camp Meeting",
            "styles": {"fontSize": "20px", "fontFamily": "Georgia", "fontWeight": "bold"}
        }))
        .unwrap();
        assert_eq!(note.date, NaiveDate::from_ymd_opt(2024, 1, 7).unwrap());
        assert_eq!(note.service_type, ServiceType::SundayMorning);
        assert_eq!(note.styles.font_size, 20);
        assert_eq!(note.styles.font_family, "Georgia");
        assert_eq!(note.styles.font_weight, FontWeight::Bold);
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(matches!(migrate_note(&json!("x")), Err(ValidationError::NotAnObject { .. })));
        assert_eq!(migrate_notes(&[json!(1), json!({"id": "ok", "title": ""})]).len(), 1);
    }

    #[test]
    fn test_validate_backup() {
        assert!(matches!(validate_backup(&json!({"id": 1})), Err(ValidationError::NotAnArray)));
        assert!(matches!(validate_backup(&json!([])), Err(ValidationError::Empty)));
        assert!(matches!(
            validate_backup(&json!([{"title": "x"}])),
            Err(ValidationError::MissingField { field: "id", .. })
        ));
        assert!(matches!(
            validate_backup(&json!([{"id": "x"}])),
            Err(ValidationError::MissingField { field: "title", .. })
        ));
        assert!(validate_backup(&json!([{"id": "x", "title": ""}])).is_ok());
    }
}
