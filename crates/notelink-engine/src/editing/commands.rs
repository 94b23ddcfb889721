use crate::editing::{Document, ModelError, Parent, Patch, Position, Selection, Writer};
use crate::schema::Schema;

/// Plain editing commands applied through [`Document::apply`].
///
/// Inline elements occupy one model offset, so every caret step and every
/// single-step deletion treats them as one unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText { text: String },
    DeleteBackward,
    DeleteForward,
    MoveLeft,
    MoveRight,
    ExtendLeft,
    ExtendRight,
    SplitBlock,
    SetSelection(Selection),
}

pub(crate) fn apply_command(
    doc: &mut Document,
    schema: &Schema,
    cmd: Cmd,
) -> Result<Patch, ModelError> {
    let ((), changed) = doc.change_with_report(schema, |writer| match cmd {
        Cmd::InsertText { text } => {
            delete_selection(writer)?;
            let at = writer.selection().focus;
            writer.insert_text(&text, at)?;
            Ok(())
        }
        Cmd::DeleteBackward => {
            if delete_selection(writer)? {
                return Ok(());
            }
            let focus = writer.selection().focus;
            match step_left(writer.document(), focus) {
                Some(previous) => writer.delete_range(previous, focus),
                None => Ok(()),
            }
        }
        Cmd::DeleteForward => {
            if delete_selection(writer)? {
                return Ok(());
            }
            let focus = writer.selection().focus;
            match step_right(writer.document(), focus) {
                Some(next) => writer.delete_range(focus, next),
                None => Ok(()),
            }
        }
        Cmd::MoveLeft => {
            let selection = writer.selection();
            let target = if selection.is_collapsed() {
                step_left(writer.document(), selection.focus).unwrap_or(selection.focus)
            } else {
                selection.start()
            };
            writer.set_selection(Selection::collapsed(target))
        }
        Cmd::MoveRight => {
            let selection = writer.selection();
            let target = if selection.is_collapsed() {
                step_right(writer.document(), selection.focus).unwrap_or(selection.focus)
            } else {
                selection.end()
            };
            writer.set_selection(Selection::collapsed(target))
        }
        Cmd::ExtendLeft => {
            let selection = writer.selection();
            let focus = step_left(writer.document(), selection.focus).unwrap_or(selection.focus);
            writer.set_selection(Selection::new(selection.anchor, focus))
        }
        Cmd::ExtendRight => {
            let selection = writer.selection();
            let focus = step_right(writer.document(), selection.focus).unwrap_or(selection.focus);
            writer.set_selection(Selection::new(selection.anchor, focus))
        }
        Cmd::SplitBlock => {
            delete_selection(writer)?;
            let at = writer.selection().focus;
            let start = writer.split_block(at)?;
            writer.set_selection(Selection::collapsed(start))
        }
        Cmd::SetSelection(selection) => writer.set_selection(selection),
    })?;

    Ok(Patch {
        changed,
        new_selection: doc.selection(),
        version: doc.version(),
    })
}

/// Deletes a non-collapsed selection; returns whether anything was deleted.
fn delete_selection(writer: &mut Writer<'_>) -> Result<bool, ModelError> {
    let selection = writer.selection();
    if selection.is_collapsed() {
        return Ok(false);
    }
    writer.delete_range(selection.start(), selection.end())?;
    Ok(true)
}

/// One offset to the left, crossing into the previous block at its start.
pub(crate) fn step_left(doc: &Document, position: Position) -> Option<Position> {
    let Parent::Block(index) = position.parent else {
        return None;
    };
    if position.offset > 0 {
        return Some(Position::new(index, position.offset - 1));
    }
    let previous = index.checked_sub(1)?;
    doc.block(previous)
        .map(|block| Position::new(previous, block.len()))
}

/// One offset to the right, crossing into the next block at its end.
pub(crate) fn step_right(doc: &Document, position: Position) -> Option<Position> {
    let Parent::Block(index) = position.parent else {
        return None;
    };
    let block = doc.block(index)?;
    if position.offset < block.len() {
        return Some(Position::new(index, position.offset + 1));
    }
    doc.block(index + 1).map(|_| Position::new(index + 1, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{Attributes, Block, Inline, InlineElement};
    use crate::schema::PARAGRAPH;
    use pretty_assertions::assert_eq;

    fn doc_with_chip() -> Document {
        // "ab" [chip] "cd"
        Document::from_blocks(vec![Block::with_children(
            PARAGRAPH,
            vec![
                Inline::Text("ab".into()),
                Inline::Element(InlineElement::new("chip", Attributes::new())),
                Inline::Text("cd".into()),
            ],
        )])
    }

    fn caret(doc: &mut Document, offset: usize) {
        doc.set_selection(Selection::collapsed(Position::new(0, offset)))
            .unwrap();
    }

    #[test]
    fn insert_text_at_caret() {
        let schema = Schema::with_builtins();
        let mut doc = Document::new();
        let patch = doc
            .apply(&schema, Cmd::InsertText { text: "hi".into() })
            .unwrap();
        assert_eq!(doc.text(), "hi");
        assert_eq!(patch.new_selection, Selection::collapsed(Position::new(0, 2)));
        assert_eq!(patch.changed, vec![0]);
        assert_eq!(patch.version, 1);
    }

    #[test]
    fn move_right_steps_over_element_in_one_step() {
        let schema = Schema::with_builtins();
        let mut doc = doc_with_chip();
        caret(&mut doc, 2);
        let patch = doc.apply(&schema, Cmd::MoveRight).unwrap();
        assert_eq!(patch.new_selection.focus, Position::new(0, 3));
        // caret moves are not content changes
        assert_eq!(patch.version, 0);
    }

    #[test]
    fn delete_backward_removes_element_whole() {
        let schema = Schema::with_builtins();
        let mut doc = doc_with_chip();
        caret(&mut doc, 3);
        doc.apply(&schema, Cmd::DeleteBackward).unwrap();
        assert_eq!(doc.blocks()[0].children(), &[Inline::Text("abcd".into())]);
        assert_eq!(doc.selection().focus, Position::new(0, 2));
    }

    #[test]
    fn delete_forward_removes_element_whole() {
        let schema = Schema::with_builtins();
        let mut doc = doc_with_chip();
        caret(&mut doc, 2);
        doc.apply(&schema, Cmd::DeleteForward).unwrap();
        assert_eq!(doc.blocks()[0].children(), &[Inline::Text("abcd".into())]);
    }

    #[test]
    fn extend_right_selects_element_as_unit() {
        let schema = Schema::with_builtins();
        let mut doc = doc_with_chip();
        caret(&mut doc, 2);
        doc.apply(&schema, Cmd::ExtendRight).unwrap();
        assert_eq!(
            doc.selection(),
            Selection::new(Position::new(0, 2), Position::new(0, 3))
        );
    }

    #[test]
    fn delete_backward_at_block_start_merges_blocks() {
        let schema = Schema::with_builtins();
        let mut doc =
            Document::from_blocks(vec![Block::paragraph("one"), Block::paragraph("two")]);
        doc.set_selection(Selection::collapsed(Position::new(1, 0)))
            .unwrap();
        doc.apply(&schema, Cmd::DeleteBackward).unwrap();
        assert_eq!(doc.text(), "onetwo");
        assert_eq!(doc.selection().focus, Position::new(0, 3));
    }

    #[test]
    fn move_left_at_document_start_stays_put() {
        let schema = Schema::with_builtins();
        let mut doc = Document::from_blocks(vec![Block::paragraph("x")]);
        caret(&mut doc, 0);
        doc.apply(&schema, Cmd::MoveLeft).unwrap();
        assert_eq!(doc.selection().focus, Position::new(0, 0));
    }

    #[test]
    fn move_collapses_range_selection() {
        let schema = Schema::with_builtins();
        let mut doc = Document::from_blocks(vec![Block::paragraph("abcdef")]);
        doc.set_selection(Selection::new(Position::new(0, 4), Position::new(0, 1)))
            .unwrap();
        doc.apply(&schema, Cmd::MoveLeft).unwrap();
        assert_eq!(doc.selection(), Selection::collapsed(Position::new(0, 1)));
    }

    #[test]
    fn split_block_puts_caret_at_new_block() {
        let schema = Schema::with_builtins();
        let mut doc = Document::from_blocks(vec![Block::paragraph("hello")]);
        caret(&mut doc, 2);
        doc.apply(&schema, Cmd::SplitBlock).unwrap();
        assert_eq!(doc.text(), "he\nllo");
        assert_eq!(doc.selection().focus, Position::new(1, 0));
    }
}
