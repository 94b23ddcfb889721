use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::cache::{CacheError, NoteMetadata};
use crate::io::{self, IoError};
use crate::models::NoteFile;

/// Where a [`NoteCache`](crate::cache::NoteCache) loads notes from.
#[async_trait(?Send)]
pub trait NoteSource {
    async fn load(&self, identifier: &str) -> Result<NoteMetadata, CacheError>;

    /// Every identifier the source can load, sorted.
    fn identifiers(&self) -> Result<Vec<String>, CacheError>;
}

/// Notes held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryNoteSource {
    notes: BTreeMap<String, String>,
}

impl MemoryNoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_note(mut self, identifier: &str, title: &str) -> Self {
        self.notes.insert(identifier.to_string(), title.to_string());
        self
    }
}

#[async_trait(?Send)]
impl NoteSource for MemoryNoteSource {
    async fn load(&self, identifier: &str) -> Result<NoteMetadata, CacheError> {
        self.notes
            .get(identifier)
            .map(|title| NoteMetadata {
                identifier: identifier.to_string(),
                title: title.clone(),
            })
            .ok_or_else(|| CacheError::NotFound(identifier.to_string()))
    }

    fn identifiers(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.notes.keys().cloned().collect())
    }
}

/// Markdown notes in a directory tree, addressed by file stem.
///
/// The directory is scanned on first use; files added afterwards are not
/// seen.
pub struct FsNoteSource {
    root: PathBuf,
    index: RefCell<Option<HashMap<String, NoteFile>>>,
}

impl FsNoteSource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, IoError> {
        let root = root.into();
        io::validate_notes_dir(&root)?;
        Ok(Self {
            root,
            index: RefCell::new(None),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lookup(&self, identifier: &str) -> Result<NoteFile, CacheError> {
        self.ensure_indexed(identifier)?;
        self.index
            .borrow()
            .as_ref()
            .and_then(|index| index.get(identifier).cloned())
            .ok_or_else(|| CacheError::NotFound(identifier.to_string()))
    }

    fn ensure_indexed(&self, identifier: &str) -> Result<(), CacheError> {
        if self.index.borrow().is_some() {
            return Ok(());
        }
        let files = io::scan_markdown_files(&self.root).map_err(|err| CacheError::Io {
            identifier: identifier.to_string(),
            message: err.to_string(),
        })?;

        let mut index: HashMap<String, NoteFile> = HashMap::new();
        for relative in files {
            let note = NoteFile::new(relative);
            if let Some(existing) = index.get(note.identifier()) {
                log::warn!(
                    "duplicate note identifier `{}`: keeping {}, ignoring {}",
                    note.identifier(),
                    existing.relative_path(),
                    note.relative_path()
                );
                continue;
            }
            index.insert(note.identifier().to_string(), note);
        }
        log::debug!("indexed {} notes under {}", index.len(), self.root.display());
        *self.index.borrow_mut() = Some(index);
        Ok(())
    }
}

#[async_trait(?Send)]
impl NoteSource for FsNoteSource {
    async fn load(&self, identifier: &str) -> Result<NoteMetadata, CacheError> {
        let note = self.lookup(identifier)?;
        let path = note.relative_path().to_path(&self.root);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| CacheError::Io {
                identifier: identifier.to_string(),
                message: err.to_string(),
            })?;
        Ok(NoteMetadata {
            identifier: identifier.to_string(),
            title: note.title(&content),
        })
    }

    fn identifiers(&self) -> Result<Vec<String>, CacheError> {
        self.ensure_indexed("")?;
        let mut identifiers: Vec<String> = self
            .index
            .borrow()
            .as_ref()
            .map(|index| index.keys().cloned().collect())
            .unwrap_or_default();
        identifiers.sort();
        Ok(identifiers)
    }
}
