use crate::editing::Selection;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Indices of blocks touched by the edit (pre-merge indices for merges)
    pub changed: Vec<usize>,
    pub new_selection: Selection,
    pub version: u64,
}
