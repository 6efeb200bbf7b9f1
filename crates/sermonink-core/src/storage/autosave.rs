//! Auto-save for the note collection.
//!
//! The whole collection is stored as one JSON array under a single key and
//! rewritten after every change.

use crate::collection::Collection;
use crate::constants::COLLECTION_KEY;
use crate::storage::{Storage, StorageError, StorageResult};
use std::sync::Arc;

/// Loads the collection once and writes it back whenever it changes.
///
/// Saving is refused until a load has succeeded, so a failed or skipped
/// initial load can never overwrite what is already stored.
pub struct CollectionStore<S: Storage> {
    /// Storage backend.
    storage: Arc<S>,
    /// Key the collection is stored under.
    key: String,
    /// Whether the initial load has completed.
    loaded: bool,
    /// Whether the collection has unsaved changes.
    dirty: bool,
    /// Serialization most recently read or written.
    last_saved: Option<String>,
}

impl<S: Storage> CollectionStore<S> {
    /// Create a store using the default collection key.
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_key(storage, COLLECTION_KEY)
    }

    /// Create a store using a custom key.
    pub fn with_key(storage: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            loaded: false,
            dirty: false,
            last_saved: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Mark the collection as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check if the collection has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the initial load has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Allow saving without a prior load, e.g. after the user imports a
    /// backup that replaces everything.
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Check if a save would do anything.
    pub fn should_save(&self) -> bool {
        self.loaded && self.dirty
    }

    /// Load and migrate the stored collection.
    ///
    /// A missing key yields the first-run collection, which is marked dirty
    /// so it gets written on the next save. Unreadable data is an error and
    /// leaves the store unloaded.
    pub async fn load(&mut self) -> StorageResult<Collection> {
        if !self.storage.exists(&self.key).await? {
            log::info!("No saved notes under '{}', starting fresh", self.key);
            self.loaded = true;
            self.dirty = true;
            self.last_saved = None;
            return Ok(Collection::first_run());
        }

        let blob = self
            .storage
            .read(&self.key)
            .await?
            .ok_or_else(|| StorageError::NotFound(self.key.clone()))?;

        let collection = Collection::from_json(&blob).map_err(|e| {
            log::error!("Stored notes under '{}' are unreadable: {}", self.key, e);
            StorageError::Serialization(e.to_string())
        })?;

        let collection = if collection.is_empty() {
            log::info!("Saved collection is empty, starting with a blank note");
            self.dirty = true;
            Collection::first_run()
        } else {
            self.dirty = false;
            collection
        };

        log::info!("Loaded {} notes", collection.len());
        self.loaded = true;
        self.last_saved = Some(blob);
        Ok(collection)
    }

    /// Save the collection if it is loaded and dirty.
    /// Returns true if a write was performed.
    pub async fn maybe_save(&mut self, collection: &Collection) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(collection).await
    }

    /// Write the collection now, unless its serialization matches what is
    /// already stored. Returns true if a write was performed.
    pub async fn save(&mut self, collection: &Collection) -> StorageResult<bool> {
        if !self.loaded {
            log::warn!("Refusing to save '{}' before the initial load", self.key);
            return Ok(false);
        }

        let json = collection
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        if self.last_saved.as_deref() == Some(json.as_str()) {
            self.dirty = false;
            return Ok(false);
        }

        self.storage.write(&self.key, json.clone()).await?;
        log::debug!("Saved {} notes ({} bytes)", collection.len(), json.len());

        self.last_saved = Some(json);
        self.dirty = false;
        Ok(true)
    }
}
