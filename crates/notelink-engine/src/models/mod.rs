pub mod note_file;

pub use note_file::{NoteFile, title_from_markdown};
