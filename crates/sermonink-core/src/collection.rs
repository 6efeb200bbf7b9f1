//! The ordered set of notes persisted as one document.

use crate::migrate::{self, ValidationError};
use crate::note::Note;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("There are no notes to export")]
    EmptyCollection,
    #[error("Failed to serialize notes: {0}")]
    Json(#[from] serde_json::Error),
}

/// All notes, in insertion or import order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Collection {
    notes: Vec<Note>,
}

impl Collection {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// The first-run collection: one blank note.
    pub fn first_run() -> Self {
        Self {
            notes: vec![Note::new()],
        }
    }

    pub fn from_notes(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    /// Parse a stored collection, migrating older note layouts.
    ///
    /// Unlike [`Collection::import_all`] this only requires an array;
    /// unreadable elements are dropped.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Array(items) = value else {
            return Err(ValidationError::NotAnArray);
        };
        Ok(Self {
            notes: migrate::migrate_notes(&items),
        })
    }

    /// Compact JSON for storage.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Build a replacement collection from an imported backup.
    ///
    /// The payload must be an array whose first element carries an id and a
    /// title. On error the caller's collection stays as it is.
    pub fn import_all(json: &str) -> Result<Self, ValidationError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let items = migrate::validate_backup(&value)?;
        let notes = migrate::migrate_notes(items);
        log::info!("Imported {} of {} notes", notes.len(), items.len());
        Ok(Self { notes })
    }

    /// Pretty-printed backup of every note.
    pub fn export_all(&self) -> Result<String, ExportError> {
        if self.notes.is_empty() {
            return Err(ExportError::EmptyCollection);
        }
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Notes in storage order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Note> {
        self.notes.get_mut(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|note| note.id == id)
    }

    /// Append a note and return its index.
    pub fn push(&mut self, note: Note) -> usize {
        self.notes.push(note);
        self.notes.len() - 1
    }

    /// Remove a note by id.
    pub fn remove(&mut self, id: &str) -> Option<Note> {
        let index = self.position(id)?;
        Some(self.notes.remove(index))
    }

    /// Notes newest first. Notes on the same day keep storage order.
    pub fn presentation_order(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().collect();
        notes.sort_by(|a, b| b.date.cmp(&a.date));
        notes
    }

    /// Notes matching a search query, newest first.
    pub fn search(&self, query: &str) -> Vec<&Note> {
        self.presentation_order()
            .into_iter()
            .filter(|note| note.matches(query))
            .collect()
    }
}

/// Suggested file name for a backup taken on `date`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("sermon-notes-backup-{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(title: &str, y: i32, m: u32, d: u32) -> Note {
        Note::new()
            .with_title(title)
            .with_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_first_run_has_one_note() {
        let collection = Collection::first_run();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.notes()[0].pages.page_count(), 1);
    }

    #[test]
    fn test_presentation_order_is_newest_first() {
        let collection = Collection::from_notes(vec![
            dated("old", 2023, 1, 1),
            dated("new", 2024, 6, 2),
            dated("same-day-a", 2023, 5, 5),
            dated("same-day-b", 2023, 5, 5),
        ]);
        let titles: Vec<&str> = collection
            .presentation_order()
            .iter()
            .map(|n| n.title.as_str())
            .collect();
        assert_eq!(titles, vec!["new", "same-day-a", "same-day-b", "old"]);
        // Storage order is untouched.
        assert_eq!(collection.notes()[0].title, "old");
    }

    #[test]
    fn test_import_replaces_notes() {
        let json = r#"[
            {"id": "1", "title": "First", "date": "2024-02-04", "content": "legacy"},
            {"id": "2", "title": "Second", "content": ["a", "b"], "drawingData": []}
        ]"#;
        let collection = Collection::import_all(json).unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.find("2").unwrap().pages.page_count(), 2);
        for note in collection.notes() {
            assert_eq!(note.pages.content().len(), note.pages.drawing_data().len());
        }
    }

    #[test]
    fn test_import_rejects_object() {
        let result = Collection::import_all(r#"{"id": "1", "title": "x"}"#);
        assert!(matches!(result, Err(ValidationError::NotAnArray)));
    }

    #[test]
    fn test_import_rejects_garbage() {
        assert!(matches!(Collection::import_all("not json"), Err(ValidationError::Json(_))));
    }

    #[test]
    fn test_export_round_trips_through_import() {
        let mut note = dated("Exported", 2024, 4, 14);
        note.pages.append_page("second", "");
        let collection = Collection::from_notes(vec![note]);

        let json = collection.export_all().unwrap();
        assert!(json.contains('\n'));
        let back = Collection::import_all(&json).unwrap();
        assert_eq!(back, collection);
    }

    #[test]
    fn test_export_empty_is_error() {
        assert!(matches!(
            Collection::new().export_all(),
            Err(ExportError::EmptyCollection)
        ));
    }

    #[test]
    fn test_from_json_drops_bad_elements() {
        let collection = Collection::from_json(r#"[{"id": "a", "title": "ok"}, 7]"#).unwrap();
        assert_eq!(collection.len(), 1);
        assert!(Collection::from_json("{}").is_err());
    }

    #[test]
    fn test_search_and_remove() {
        let mut collection = Collection::from_notes(vec![
            dated("Grace", 2024, 1, 1),
            dated("Law", 2024, 1, 2),
        ]);
        let found = collection.search("grace");
        assert_eq!(found.len(), 1);
        let id = found[0].id.clone();

        assert!(collection.remove(&id).is_some());
        assert_eq!(collection.len(), 1);
        assert!(collection.find(&id).is_none());
    }

    #[test]
    fn test_backup_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(backup_file_name(date), "sermon-notes-backup-2024-12-25.json");
    }
}
