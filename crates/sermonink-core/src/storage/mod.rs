//! Storage abstraction for persistence.
//!
//! Backends are plain key-value blob stores; the collection is written as
//! one JSON document under a single key by [`CollectionStore`].

mod autosave;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use autosave::CollectionStore;
pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Key-value blob store.
///
/// Writes replace the whole value for a key; there are no partial updates.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    /// Read the blob stored under `key`, if any.
    fn read(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    /// Replace the blob stored under `key`.
    fn write(&self, key: &str, blob: String) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete the blob stored under `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Check whether a blob is stored under `key`.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Key-value blob store (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    /// Read the blob stored under `key`, if any.
    fn read(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    /// Replace the blob stored under `key`.
    fn write(&self, key: &str, blob: String) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete the blob stored under `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Check whether a blob is stored under `key`.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
