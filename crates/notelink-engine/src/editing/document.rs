use crate::editing::{Block, Cmd, Parent, Patch, Position, Selection, Writer};
use crate::schema::{PARAGRAPH, ROOT, Schema};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("position {0:?} is outside the document")]
    InvalidPosition(Position),
    #[error("`{child}` is not allowed in `{parent}`")]
    NotAllowed { parent: String, child: String },
    #[error("`{0}` is not a registered schema item")]
    UnknownItem(String),
    #[error("`{0}` is not an inline item")]
    NotInline(String),
    #[error("attribute `{attribute}` is not allowed on `{item}`")]
    DisallowedAttribute { item: String, attribute: String },
}

/// Content plus selection: everything undo/redo and rollback restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    pub blocks: Vec<Block>,
    pub selection: Selection,
}

/// The document model.
///
/// A document is an ordered list of blocks, each holding text runs and
/// atomic inline elements. All mutations go through [`Document::change`],
/// which hands out a [`Writer`] and applies the closure's edits as one
/// atomic step:
///
/// - **Atomic**: if the closure fails, content *and* selection roll back
/// - **Undoable**: each successful change is one undo step
/// - **Versioned**: `version()` increments on every content change
///
/// ```rust
/// # use notelink_engine::editing::{Document, Position};
/// # use notelink_engine::schema::Schema;
/// let schema = Schema::with_builtins();
/// let mut doc = Document::new();
///
/// doc.change(&schema, |writer| {
///     writer.insert_text("Hello", Position::new(0, 0))?;
///     Ok(())
/// })
/// .unwrap();
///
/// assert_eq!(doc.text(), "Hello");
/// assert_eq!(doc.version(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) blocks: Vec<Block>,
    pub(crate) selection: Selection,
    pub(crate) version: u64,
    undo_stack: Vec<DocumentState>,
    redo_stack: Vec<DocumentState>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding one empty paragraph.
    pub fn new() -> Self {
        Self::from_blocks(vec![Block::new(PARAGRAPH)])
    }

    /// A document from existing blocks, selection at the start.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let selection = Selection::collapsed(start_of(&blocks));
        Self {
            blocks,
            selection,
            version: 0,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Snapshot of content and selection.
    pub fn state(&self) -> DocumentState {
        DocumentState {
            blocks: self.blocks.clone(),
            selection: self.selection,
        }
    }

    /// Block texts joined by newlines.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Schema name of the container a position points into.
    pub fn parent_name(&self, parent: Parent) -> &str {
        match parent {
            Parent::Root => ROOT,
            Parent::Block(index) => self.blocks.get(index).map_or(ROOT, Block::name),
        }
    }

    pub fn start_position(&self) -> Position {
        start_of(&self.blocks)
    }

    pub fn end_position(&self) -> Position {
        match self.blocks.last() {
            Some(block) => Position::new(self.blocks.len() - 1, block.len()),
            None => Position::in_root(0),
        }
    }

    pub fn validate_position(&self, position: Position) -> Result<(), ModelError> {
        let valid = match position.parent {
            Parent::Root => position.offset <= self.blocks.len(),
            Parent::Block(index) => self
                .blocks
                .get(index)
                .is_some_and(|block| position.offset <= block.len()),
        };
        if valid {
            Ok(())
        } else {
            Err(ModelError::InvalidPosition(position))
        }
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), ModelError> {
        self.validate_position(selection.anchor)?;
        self.validate_position(selection.focus)?;
        self.selection = selection;
        Ok(())
    }

    /// Runs `f` as one atomic, undoable change.
    pub fn change<R>(
        &mut self,
        schema: &Schema,
        f: impl FnOnce(&mut Writer<'_>) -> Result<R, ModelError>,
    ) -> Result<R, ModelError> {
        self.change_with_report(schema, f).map(|(value, _)| value)
    }

    /// Like [`Document::change`], also reporting which blocks were touched.
    pub(crate) fn change_with_report<R>(
        &mut self,
        schema: &Schema,
        f: impl FnOnce(&mut Writer<'_>) -> Result<R, ModelError>,
    ) -> Result<(R, Vec<usize>), ModelError> {
        let before = self.state();
        let mut writer = Writer::new(self, schema);
        let result = f(&mut writer);
        let changed = writer.has_changes();
        let changed_blocks = writer.changed_blocks();

        match result {
            Ok(value) => {
                if changed {
                    self.undo_stack.push(before);
                    self.redo_stack.clear();
                    self.version += 1;
                }
                Ok((value, changed_blocks))
            }
            Err(err) => {
                log::debug!("rolling back change: {err}");
                self.restore(before);
                Err(err)
            }
        }
    }

    /// Applies a plain editing command as one change.
    pub fn apply(&mut self, schema: &Schema, cmd: Cmd) -> Result<Patch, ModelError> {
        crate::editing::commands::apply_command(self, schema, cmd)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(self.state());
        self.restore(previous);
        self.version += 1;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(self.state());
        self.restore(next);
        self.version += 1;
        true
    }

    /// Replaces the whole content, dropping history.
    pub fn reset(&mut self, blocks: Vec<Block>) {
        self.selection = Selection::collapsed(start_of(&blocks));
        self.blocks = blocks;
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.version += 1;
    }

    fn restore(&mut self, state: DocumentState) {
        self.blocks = state.blocks;
        self.selection = state.selection;
    }
}

fn start_of(blocks: &[Block]) -> Position {
    if blocks.is_empty() {
        Position::in_root(0)
    } else {
        Position::new(0, 0)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        // History is not part of identity
        self.blocks == other.blocks
            && self.selection == other.selection
            && self.version == other.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::Inline;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        Schema::with_builtins()
    }

    #[test]
    fn new_document_has_one_empty_paragraph() {
        let doc = Document::new();
        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.blocks()[0].name(), PARAGRAPH);
        assert_eq!(doc.selection(), Selection::collapsed(Position::new(0, 0)));
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn empty_document_selection_sits_in_root() {
        let doc = Document::from_blocks(vec![]);
        assert_eq!(doc.selection().focus, Position::in_root(0));
        assert_eq!(doc.parent_name(doc.selection().focus.parent), ROOT);
    }

    #[test]
    fn change_bumps_version_and_records_undo() {
        let mut doc = Document::new();
        doc.change(&schema(), |w| w.insert_text("abc", Position::new(0, 0)).map(|_| ()))
            .unwrap();
        assert_eq!(doc.text(), "abc");
        assert_eq!(doc.version(), 1);
        assert!(doc.can_undo());

        assert!(doc.undo());
        assert_eq!(doc.text(), "");
        assert!(doc.redo());
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn failed_change_rolls_back_content_and_selection() {
        let mut doc = Document::from_blocks(vec![Block::paragraph("keep")]);
        let before = doc.state();

        let result = doc.change(&schema(), |w| {
            w.insert_text("lost", Position::new(0, 0))?;
            w.set_selection(Selection::collapsed(Position::new(0, 2)))?;
            w.insert_text("boom", Position::new(7, 0))?;
            Ok(())
        });

        assert_eq!(
            result,
            Err(ModelError::InvalidPosition(Position::new(7, 0)))
        );
        assert_eq!(doc.state(), before);
        assert_eq!(doc.version(), 0);
        assert!(!doc.can_undo());
    }

    #[test]
    fn change_without_edits_is_not_an_undo_step() {
        let mut doc = Document::from_blocks(vec![Block::paragraph("abc")]);
        doc.change(&schema(), |w| {
            w.set_selection(Selection::collapsed(Position::new(0, 2)))
        })
        .unwrap();
        assert_eq!(doc.version(), 0);
        assert!(!doc.can_undo());
        assert_eq!(doc.selection().focus, Position::new(0, 2));
    }

    #[test]
    fn set_selection_rejects_out_of_range_offsets() {
        let mut doc = Document::from_blocks(vec![Block::paragraph("abc")]);
        let result = doc.set_selection(Selection::collapsed(Position::new(0, 4)));
        assert!(matches!(result, Err(ModelError::InvalidPosition(_))));
    }

    #[test]
    fn end_position_points_after_last_block_content() {
        let doc = Document::from_blocks(vec![
            Block::paragraph("one"),
            Block::with_children(PARAGRAPH, vec![Inline::Text("three".into())]),
        ]);
        assert_eq!(doc.end_position(), Position::new(1, 5));
    }

    #[test]
    fn reset_clears_history() {
        let mut doc = Document::new();
        doc.change(&schema(), |w| w.insert_text("abc", Position::new(0, 0)).map(|_| ()))
            .unwrap();
        doc.reset(vec![Block::paragraph("fresh")]);
        assert!(!doc.can_undo());
        assert_eq!(doc.text(), "fresh");
        assert_eq!(doc.selection().focus, Position::new(0, 0));
    }
}
