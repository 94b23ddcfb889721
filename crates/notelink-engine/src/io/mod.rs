use std::fs;
use std::path::{Path, PathBuf};

use relative_path::RelativePathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid notes directory: {0}")]
    InvalidNotesDir(String),
}

/// Every `*.md` file under `notes_root`, relative to it and sorted.
///
/// Hidden files and directories (`.git`, `.obsidian`, ...) are skipped.
pub fn scan_markdown_files(notes_root: &Path) -> Result<Vec<RelativePathBuf>, IoError> {
    validate_notes_dir(notes_root)?;

    let mut found = Vec::new();
    let mut pending: Vec<PathBuf> = vec![notes_root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if is_hidden(&path) {
                continue;
            }
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "md") {
                match path
                    .strip_prefix(notes_root)
                    .ok()
                    .and_then(|relative| RelativePathBuf::from_path(relative).ok())
                {
                    Some(relative) => found.push(relative),
                    None => log::warn!("skipping unaddressable note {}", path.display()),
                }
            }
        }
    }
    found.sort();
    Ok(found)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

pub fn validate_notes_dir(path: &Path) -> Result<(), IoError> {
    if !path.is_dir() {
        return Err(IoError::InvalidNotesDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    Ok(())
}
