//! Application state for one editing session.

use chrono::{Local, NaiveDate};
use kurbo::{Point, Rect};
use sermonink_core::capture::{CaptureResponse, StrokeCapture};
use sermonink_core::collection::{Collection, ExportError, backup_file_name};
use sermonink_core::config::EditorConfig;
use sermonink_core::constants::{PEN_COLORS, PEN_THICKNESSES};
use sermonink_core::layout::TextLayout;
use sermonink_core::migrate::ValidationError;
use sermonink_core::note::{Note, NoteStyles, ServiceType};
use sermonink_core::pages::PageError;
use sermonink_core::pagination::{PaginationEngine, PaginationOutcome};
use sermonink_core::storage::{CollectionStore, Storage, StorageError};
use sermonink_core::stroke::Tool;
use sermonink_render::{PageCanvas, RasterSurface, RendererError, parse_color};
use std::sync::Arc;
use thiserror::Error;

/// Session errors. Display text is suitable for showing to the user.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid backup file: {0}")]
    Import(#[from] ValidationError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error("No note with id {0}")]
    UnknownNote(String),
    #[error("No note is open")]
    NoActiveNote,
}

/// Metadata fields to change on the active note. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct MetadataUpdate {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub service_type: Option<ServiceType>,
    pub passage: Option<String>,
}

/// A backup ready to be written to a user-chosen file.
#[derive(Debug, Clone, PartialEq)]
pub struct Backup {
    pub file_name: String,
    pub json: String,
}

/// Everything the editor needs between input events.
pub struct Session<S: Storage> {
    collection: Collection,
    active_note: usize,
    active_page: usize,
    capture: StrokeCapture,
    engine: PaginationEngine,
    layout: Box<dyn TextLayout>,
    canvas: PageCanvas,
    store: CollectionStore<S>,
    config: EditorConfig,
}

/// Pixel size of the drawing layer for a page geometry.
fn canvas_size(config: &EditorConfig) -> (u32, u32) {
    let width = config.page.width.round().max(1.0) as u32;
    let height = config.page.height.round().max(1.0) as u32;
    (width, height)
}

impl<S: Storage> Session<S> {
    /// Load the stored collection and open the newest note.
    ///
    /// If the stored data cannot be read the session starts with a blank
    /// note but never saves over the stored data, unless the user imports
    /// a backup.
    pub async fn open(
        storage: Arc<S>,
        config: EditorConfig,
        layout: Box<dyn TextLayout>,
    ) -> Result<Self, SessionError> {
        let mut store = CollectionStore::with_key(storage, config.storage_key.clone());
        let collection = match store.load().await {
            Ok(collection) => collection,
            Err(e) => {
                log::error!("Failed to load notes, autosave disabled: {}", e);
                Collection::first_run()
            }
        };
        Self::from_parts(collection, store, config, layout)
    }

    fn from_parts(
        collection: Collection,
        store: CollectionStore<S>,
        config: EditorConfig,
        layout: Box<dyn TextLayout>,
    ) -> Result<Self, SessionError> {
        let (width, height) = canvas_size(&config);
        let mut capture = StrokeCapture::new();
        capture.color = config.pen_color.clone();
        capture.thickness = config.pen_thickness;

        let mut session = Self {
            collection,
            active_note: 0,
            active_page: 0,
            capture,
            engine: PaginationEngine::new(config.page).with_policy(config.split_policy),
            layout,
            canvas: PageCanvas::new(width, height)?,
            store,
            config,
        };
        session.ensure_note();
        if let Some(newest) = session.collection.presentation_order().first().map(|n| n.id.clone()) {
            session.select_note(&newest)?;
        }
        Ok(session)
    }

    /// Keep at least one note so there is always something to edit.
    fn ensure_note(&mut self) {
        if self.collection.is_empty() {
            self.collection.push(Note::new());
            self.store.mark_dirty();
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn active_note(&self) -> Option<&Note> {
        self.collection.get(self.active_note)
    }

    fn active_note_mut(&mut self) -> Result<&mut Note, SessionError> {
        self.collection
            .get_mut(self.active_note)
            .ok_or(SessionError::NoActiveNote)
    }

    pub fn active_page(&self) -> usize {
        self.active_page
    }

    pub fn capture(&self) -> &StrokeCapture {
        &self.capture
    }

    /// Whether there are changes not yet written to storage.
    pub fn has_unsaved_changes(&self) -> bool {
        self.store.is_dirty()
    }

    /// Sync capture and canvas with the active page's stored drawing.
    fn load_active_page(&mut self) {
        let drawing = self
            .active_note()
            .and_then(|note| note.pages.get(self.active_page))
            .map(|page| page.drawing.to_string())
            .unwrap_or_default();
        self.capture.load_page(&drawing);
        self.canvas.set_drawing(&drawing);
    }

    /// Create a blank note and open it.
    pub fn new_note(&mut self) -> String {
        let note = Note::new();
        let id = note.id.clone();
        self.active_note = self.collection.push(note);
        self.active_page = 0;
        self.load_active_page();
        self.store.mark_dirty();
        log::info!("Created note {}", id);
        id
    }

    /// Open a note on its first page.
    pub fn select_note(&mut self, id: &str) -> Result<(), SessionError> {
        let index = self
            .collection
            .position(id)
            .ok_or_else(|| SessionError::UnknownNote(id.to_string()))?;
        self.active_note = index;
        self.active_page = 0;
        self.load_active_page();
        Ok(())
    }

    pub fn update_metadata(&mut self, update: MetadataUpdate) -> Result<(), SessionError> {
        let note = self.active_note_mut()?;
        if let Some(title) = update.title {
            note.set_title(title);
        }
        if let Some(date) = update.date {
            note.set_date(date);
        }
        if let Some(service_type) = update.service_type {
            note.set_service_type(service_type);
        }
        if let Some(passage) = update.passage {
            note.set_passage(passage);
        }
        self.store.mark_dirty();
        Ok(())
    }

    /// Change the note's text styles. Larger text may overflow the active
    /// page, so it is paginated again.
    pub fn set_styles(&mut self, styles: NoteStyles) -> Result<PaginationOutcome, SessionError> {
        self.active_note_mut()?.set_styles(styles);
        self.store.mark_dirty();
        self.paginate()
    }

    /// Replace the active page's content and flow any overflow forward.
    pub fn edit_text(&mut self, html: impl Into<String>) -> Result<PaginationOutcome, SessionError> {
        let page = self.active_page;
        self.active_note_mut()?.pages.set_content(page, html)?;
        self.store.mark_dirty();
        self.paginate()
    }

    fn paginate(&mut self) -> Result<PaginationOutcome, SessionError> {
        let note = self
            .collection
            .get_mut(self.active_note)
            .ok_or(SessionError::NoActiveNote)?;
        let outcome = self.engine.paginate(
            self.layout.as_ref(),
            &mut note.pages,
            &mut self.active_page,
            &note.styles,
        )?;
        if let PaginationOutcome::Split { from, to, created } = outcome {
            log::debug!("Page {} overflowed into page {} (new: {})", from, to, created);
            self.load_active_page();
        }
        Ok(outcome)
    }

    pub fn go_to_page(&mut self, index: usize) -> Result<(), SessionError> {
        let count = self
            .active_note()
            .ok_or(SessionError::NoActiveNote)?
            .pages
            .page_count();
        if index >= count {
            return Err(PageError::OutOfRange { index, count }.into());
        }
        self.active_page = index;
        self.load_active_page();
        Ok(())
    }

    /// Select a drawing tool, or `None` to return to text editing.
    pub fn select_tool(&mut self, tool: Option<Tool>) {
        self.capture.set_tool(tool);
        self.load_active_page();
    }

    /// Set the ink color from a palette label such as "Red" or a CSS color.
    ///
    /// Returns false and keeps the current color if neither matches.
    pub fn set_pen_color(&mut self, color: &str) -> bool {
        let color = PEN_COLORS
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(color))
            .map_or(color, |(_, css)| *css);
        if parse_color(color).is_none() {
            log::warn!("Ignoring unreadable pen color '{}'", color);
            return false;
        }
        self.capture.color = color.to_string();
        true
    }

    /// Set the pen width, snapped to the nearest offered thickness.
    pub fn set_pen_thickness(&mut self, thickness: u32) {
        self.capture.thickness = PEN_THICKNESSES
            .iter()
            .copied()
            .min_by_key(|option| option.abs_diff(thickness))
            .unwrap_or(thickness)
            .max(1);
    }

    /// Start a gesture at a client coordinate over the page surface.
    pub fn pointer_down(&mut self, client: Point, surface_bounds: Rect) -> CaptureResponse {
        let response = self.capture.begin(client, surface_bounds);
        if response == CaptureResponse::Consumed {
            self.canvas.show_strokes(self.capture.strokes());
        }
        response
    }

    pub fn pointer_move(&mut self, client: Point, surface_bounds: Rect) -> CaptureResponse {
        let response = self.capture.extend(client, surface_bounds);
        if response == CaptureResponse::Consumed {
            if let Some(stroke) = self.capture.strokes().last() {
                self.canvas.extend_live(stroke);
            }
        }
        response
    }

    /// Finish the gesture. Returns true if the page's drawing changed.
    pub fn pointer_up(&mut self) -> Result<bool, SessionError> {
        let Some(data) = self.capture.end() else {
            self.load_active_page();
            return Ok(false);
        };
        let page = self.active_page;
        self.active_note_mut()?.pages.set_drawing(page, data.clone())?;
        self.canvas.set_drawing(&data);
        self.store.mark_dirty();
        Ok(true)
    }

    /// Match the drawing layer to a new surface size.
    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<(), SessionError> {
        self.canvas.resize(width, height)?;
        if self.capture.is_drawing() {
            self.canvas.show_strokes(self.capture.strokes());
        }
        Ok(())
    }

    /// The active page's drawing layer, up to date with any live stroke.
    pub fn render_active_page(&mut self) -> &RasterSurface {
        if self.capture.is_drawing() {
            self.canvas.show_strokes(self.capture.strokes());
        } else {
            self.load_active_page();
        }
        self.canvas.surface()
    }

    /// PNG snapshot of the active page's drawing layer.
    pub fn export_page_png(&mut self) -> Result<Vec<u8>, SessionError> {
        self.render_active_page();
        Ok(self.canvas.to_png()?)
    }

    /// Replace every note with the contents of a backup.
    ///
    /// On error nothing changes. Returns the number of imported notes.
    pub fn import(&mut self, json: &str) -> Result<usize, SessionError> {
        let collection = Collection::import_all(json)?;
        let count = collection.len();
        self.collection = collection;
        self.ensure_note();
        self.store.mark_loaded();
        self.store.mark_dirty();

        self.active_note = 0;
        if let Some(newest) = self.collection.presentation_order().first().map(|n| n.id.clone()) {
            self.select_note(&newest)?;
        }
        log::info!("Replaced collection with {} imported notes", count);
        Ok(count)
    }

    /// Backup of every note, named for today.
    pub fn export(&self) -> Result<Backup, SessionError> {
        let json = self.collection.export_all()?;
        let file_name = backup_file_name(Local::now().date_naive());
        log::info!("Exported {} notes to {}", self.collection.len(), file_name);
        Ok(Backup { file_name, json })
    }

    /// Notes newest first.
    pub fn presentation_order(&self) -> Vec<&Note> {
        self.collection.presentation_order()
    }

    pub fn search(&self, query: &str) -> Vec<&Note> {
        self.collection.search(query)
    }

    /// Write the collection to storage if it changed.
    ///
    /// Failures are logged and the changes stay in memory for the next
    /// attempt. Returns true if a write happened.
    pub async fn persist(&mut self) -> bool {
        match self.store.maybe_save(&self.collection).await {
            Ok(saved) => saved,
            Err(e) => {
                log::error!("Failed to save notes: {}", e);
                false
            }
        }
    }
}
