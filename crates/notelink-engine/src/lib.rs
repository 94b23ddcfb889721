pub mod cache;
pub mod conversion;
pub mod editing;
pub mod editor;
pub mod io;
pub mod models;
pub mod parsing;
pub mod reference;
pub mod schema;
pub mod view;

// Re-export key types for easier usage
pub use cache::{CacheError, NoteCache, NoteMetadata, ResourceCache};
pub use editing::{Cmd, Document, ModelError, Position, Selection};
pub use editor::{CommandArgs, Editor, EditorError, Plugin};
pub use io::IoError;
pub use reference::{ReferenceLink, ReferenceNode, referenced_identifiers};
