//! Note metadata cache consumed by reference widgets.
//!
//! [`ResourceCache`] is the contract: an async `ensure_loaded` that fetches
//! metadata if needed, and a synchronous lookup that never fetches.
//! [`NoteCache`] implements it on top of a [`NoteSource`].

pub mod note_cache;
pub mod source;

use async_trait::async_trait;

pub use note_cache::NoteCache;
pub use source::{FsNoteSource, MemoryNoteSource, NoteSource};

/// What the cache knows about a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMetadata {
    pub identifier: String,
    pub title: String,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("no note with identifier `{0}`")]
    NotFound(String),
    #[error("failed to load note `{identifier}`: {message}")]
    Io { identifier: String, message: String },
}

#[async_trait(?Send)]
pub trait ResourceCache {
    /// Fetches and caches metadata for `identifier` unless already cached.
    async fn ensure_loaded(&self, identifier: &str) -> Result<(), CacheError>;

    /// Cached metadata, if any. Never fetches.
    fn get_from_cache_sync(&self, identifier: &str) -> Option<NoteMetadata>;

    async fn resolve_title(&self, identifier: &str) -> Result<String, CacheError> {
        self.ensure_loaded(identifier).await?;
        self.get_from_cache_sync(identifier)
            .map(|metadata| metadata.title)
            .ok_or_else(|| CacheError::NotFound(identifier.to_string()))
    }
}
