use std::collections::BTreeSet;

use crate::editing::{
    Attributes, Block, Document, Inline, InlineElement, ModelError, Parent, Position, Selection,
};
use crate::schema::{Schema, TEXT};

/// Mutation handle passed to [`Document::change`] closures.
///
/// Every operation validates positions and checks the schema before
/// touching the document; the selection is kept valid across edits.
pub struct Writer<'a> {
    doc: &'a mut Document,
    schema: &'a Schema,
    changed: BTreeSet<usize>,
    structural: bool,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(doc: &'a mut Document, schema: &'a Schema) -> Self {
        Self {
            doc,
            schema,
            changed: BTreeSet::new(),
            structural: false,
        }
    }

    pub(crate) fn has_changes(&self) -> bool {
        self.structural || !self.changed.is_empty()
    }

    pub(crate) fn changed_blocks(&self) -> Vec<usize> {
        self.changed.iter().copied().collect()
    }

    pub fn document(&self) -> &Document {
        self.doc
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn selection(&self) -> Selection {
        self.doc.selection
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), ModelError> {
        self.doc.set_selection(selection)
    }

    /// Collapses the selection right after the item that starts at `position`.
    pub fn set_selection_after(&mut self, position: Position) -> Result<(), ModelError> {
        let after = Position {
            offset: position.offset + 1,
            ..position
        };
        self.doc.set_selection(Selection::collapsed(after))
    }

    pub fn create_element<K, V>(
        &self,
        name: &str,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> Result<InlineElement, ModelError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        create_element(self.schema, name, attributes)
    }

    /// Inserts text at `at`; returns the position after it.
    pub fn insert_text(&mut self, text: &str, at: Position) -> Result<Position, ModelError> {
        let index = self.block_for(at, TEXT)?;
        if text.is_empty() {
            return Ok(at);
        }
        let len = text.chars().count();
        self.doc.blocks[index].insert(at.offset, Inline::Text(text.to_string()));
        self.shift_after_insert(at, len);
        self.changed.insert(index);
        Ok(Position::new(index, at.offset + len))
    }

    /// Inserts an element at `at`; returns the element's position.
    pub fn insert_element(
        &mut self,
        element: InlineElement,
        at: Position,
    ) -> Result<Position, ModelError> {
        let index = self.block_for(at, element.name())?;
        self.doc.blocks[index].insert(at.offset, Inline::Element(element));
        self.shift_after_insert(at, 1);
        self.changed.insert(index);
        Ok(at)
    }

    /// Replaces the selection with `element`, leaving the selection after
    /// it. Returns the element's position.
    pub fn insert_content(&mut self, element: InlineElement) -> Result<Position, ModelError> {
        let selection = self.doc.selection;
        if !selection.is_collapsed() {
            self.delete_range(selection.start(), selection.end())?;
        }
        let at = self.doc.selection.focus;
        let inserted = self.insert_element(element, at)?;
        self.set_selection_after(inserted)?;
        Ok(inserted)
    }

    /// Deletes everything between two block positions, merging blocks when
    /// the range crosses a block boundary.
    pub fn delete_range(&mut self, from: Position, to: Position) -> Result<(), ModelError> {
        self.doc.validate_position(from)?;
        self.doc.validate_position(to)?;
        let (start, end) = (from.min(to), from.max(to));
        let (Some(first), Some(last)) = (start.block(), end.block()) else {
            return Err(ModelError::InvalidPosition(start));
        };
        if start == end {
            return Ok(());
        }

        if first == last {
            self.doc.blocks[first].remove(start.offset..end.offset);
        } else {
            self.check_merge(first, end)?;
            let tail = self.doc.blocks[last].split_off(end.offset);
            let first_len = self.doc.blocks[first].len();
            self.doc.blocks[first].remove(start.offset..first_len);
            self.doc.blocks[first].append(tail);
            self.doc.blocks.drain(first + 1..=last);
            self.structural = true;
        }
        self.changed.insert(first);

        let selection = self.doc.selection;
        self.doc.selection = Selection::new(
            map_after_delete(selection.anchor, start, end),
            map_after_delete(selection.focus, start, end),
        );
        Ok(())
    }

    /// Splits the block at `at` in two; returns the start of the new block.
    pub fn split_block(&mut self, at: Position) -> Result<Position, ModelError> {
        self.doc.validate_position(at)?;
        let Some(index) = at.block() else {
            return Err(ModelError::InvalidPosition(at));
        };
        let tail = self.doc.blocks[index].split_off(at.offset);
        let name = self.doc.blocks[index].name().to_string();
        self.doc
            .blocks
            .insert(index + 1, Block::with_children(name, tail));
        self.changed.insert(index);
        self.changed.insert(index + 1);
        self.structural = true;

        let split = |position: Position| match position.parent {
            Parent::Block(b) if b == index && position.offset >= at.offset => {
                Position::new(index + 1, position.offset - at.offset)
            }
            Parent::Block(b) if b > index => Position::new(b + 1, position.offset),
            _ => position,
        };
        let selection = self.doc.selection;
        self.doc.selection = Selection::new(split(selection.anchor), split(selection.focus));
        Ok(Position::new(index + 1, 0))
    }

    /// Everything after `from` must be allowed in block `into` once merged.
    fn check_merge(&self, into: usize, from: Position) -> Result<(), ModelError> {
        let (Some(target), Some(source)) = (
            self.doc.block(into),
            from.block().and_then(|index| self.doc.block(index)),
        ) else {
            return Err(ModelError::InvalidPosition(from));
        };
        let mut offset = 0;
        for child in source.children() {
            offset += child.len();
            if offset <= from.offset {
                continue;
            }
            let name = match child {
                Inline::Text(_) => TEXT,
                Inline::Element(element) => element.name(),
            };
            if !self.schema.check_child(target.name(), name) {
                return Err(ModelError::NotAllowed {
                    parent: target.name().to_string(),
                    child: name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn block_for(&self, at: Position, child: &str) -> Result<usize, ModelError> {
        self.doc.validate_position(at)?;
        let parent = self.doc.parent_name(at.parent);
        if !self.schema.check_child(parent, child) {
            return Err(ModelError::NotAllowed {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        at.block().ok_or(ModelError::InvalidPosition(at))
    }

    fn shift_after_insert(&mut self, at: Position, len: usize) {
        let shift = |position: Position| {
            if position.parent == at.parent && position.offset >= at.offset {
                Position {
                    offset: position.offset + len,
                    ..position
                }
            } else {
                position
            }
        };
        let selection = self.doc.selection;
        self.doc.selection = Selection::new(shift(selection.anchor), shift(selection.focus));
    }
}

/// Schema-checked element construction shared by writers and upcasting.
pub(crate) fn create_element<K, V>(
    schema: &Schema,
    name: &str,
    attributes: impl IntoIterator<Item = (K, V)>,
) -> Result<InlineElement, ModelError>
where
    K: Into<String>,
    V: Into<String>,
{
    if !schema.is_registered(name) {
        return Err(ModelError::UnknownItem(name.to_string()));
    }
    if !schema.is_inline(name) {
        return Err(ModelError::NotInline(name.to_string()));
    }
    let mut checked = Attributes::new();
    for (key, value) in attributes {
        let key = key.into();
        if !schema.check_attribute(name, &key) {
            return Err(ModelError::DisallowedAttribute {
                item: name.to_string(),
                attribute: key,
            });
        }
        checked.insert(key, value.into());
    }
    Ok(InlineElement::new(name, checked))
}

fn map_after_delete(position: Position, start: Position, end: Position) -> Position {
    if position <= start {
        return position;
    }
    if position <= end {
        return start;
    }
    match (position.parent, start.block(), end.block()) {
        (Parent::Block(b), Some(first), Some(last)) if b == last => {
            Position::new(first, start.offset + position.offset - end.offset)
        }
        (Parent::Block(b), Some(first), Some(last)) => Position::new(b - (last - first), position.offset),
        _ => position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CODE_BLOCK, PARAGRAPH, SchemaItemDefinition};
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        let mut schema = Schema::with_builtins();
        schema
            .register(
                "chip",
                SchemaItemDefinition {
                    allow_where: Some(TEXT.to_string()),
                    allow_attributes: vec!["label".to_string()],
                    is_inline: true,
                    is_object: true,
                    ..Default::default()
                },
            )
            .unwrap();
        schema
    }

    #[test]
    fn create_element_checks_attributes() {
        let schema = schema();
        let ok = create_element(&schema, "chip", [("label", "x")]).unwrap();
        assert_eq!(ok.attribute("label"), Some("x"));

        let err = create_element(&schema, "chip", [("href", "x")]).unwrap_err();
        assert_eq!(
            err,
            ModelError::DisallowedAttribute {
                item: "chip".into(),
                attribute: "href".into()
            }
        );
    }

    #[test]
    fn create_element_rejects_blocks_and_unknown_items() {
        let schema = schema();
        let no_attrs: [(&str, &str); 0] = [];
        assert_eq!(
            create_element(&schema, PARAGRAPH, no_attrs),
            Err(ModelError::NotInline(PARAGRAPH.into()))
        );
        assert_eq!(
            create_element(&schema, "ghost", no_attrs),
            Err(ModelError::UnknownItem("ghost".into()))
        );
    }

    #[test]
    fn insert_content_replaces_selection_and_moves_after() {
        let schema = schema();
        let mut doc = Document::from_blocks(vec![Block::paragraph("abcdef")]);
        doc.set_selection(Selection::new(Position::new(0, 1), Position::new(0, 3)))
            .unwrap();

        let at = doc
            .change(&schema, |w| {
                let chip = w.create_element("chip", [("label", "x")])?;
                w.insert_content(chip)
            })
            .unwrap();

        assert_eq!(at, Position::new(0, 1));
        assert_eq!(doc.blocks()[0].text(), "adef");
        assert!(doc.blocks()[0].element_at(1).is_some());
        assert_eq!(doc.selection(), Selection::collapsed(Position::new(0, 2)));
    }

    #[test]
    fn insert_element_into_code_block_is_rejected() {
        let schema = schema();
        let mut doc = Document::from_blocks(vec![Block::new(CODE_BLOCK)]);
        let result = doc.change(&schema, |w| {
            let chip = w.create_element("chip", [("label", "x")])?;
            w.insert_content(chip)
        });
        assert_eq!(
            result,
            Err(ModelError::NotAllowed {
                parent: CODE_BLOCK.into(),
                child: "chip".into()
            })
        );
    }

    #[test]
    fn delete_across_blocks_merges_them() {
        let schema = schema();
        let mut doc = Document::from_blocks(vec![
            Block::paragraph("hello"),
            Block::paragraph("middle"),
            Block::paragraph("world"),
        ]);
        doc.set_selection(Selection::collapsed(Position::new(2, 5)))
            .unwrap();

        doc.change(&schema, |w| {
            w.delete_range(Position::new(0, 2), Position::new(2, 1))
        })
        .unwrap();

        assert_eq!(doc.text(), "heorld");
        assert_eq!(doc.selection().focus, Position::new(0, 6));
    }

    #[test]
    fn merge_rejects_content_the_first_block_cannot_hold() {
        let schema = schema();
        let mut doc = Document::from_blocks(vec![Block::new(CODE_BLOCK), Block::paragraph("ab")]);
        doc.change(&schema, |w| {
            w.insert_text("x", Position::new(0, 0))?;
            let chip = w.create_element("chip", [("label", "c")])?;
            w.insert_element(chip, Position::new(1, 1))
        })
        .unwrap();
        let before = doc.state();

        let result = doc.change(&schema, |w| {
            w.delete_range(Position::new(0, 1), Position::new(1, 0))
        });

        assert_eq!(
            result,
            Err(ModelError::NotAllowed {
                parent: CODE_BLOCK.into(),
                child: "chip".into()
            })
        );
        assert_eq!(doc.state(), before);

        // text after the chip alone merges fine
        doc.change(&schema, |w| {
            w.delete_range(Position::new(0, 1), Position::new(1, 2))
        })
        .unwrap();
        assert_eq!(doc.blocks(), &[Block::with_children(CODE_BLOCK, vec![Inline::Text("xb".into())])]);
    }

    #[test]
    fn split_block_moves_trailing_selection() {
        let schema = schema();
        let mut doc = Document::from_blocks(vec![Block::paragraph("hello world")]);
        doc.set_selection(Selection::collapsed(Position::new(0, 8)))
            .unwrap();

        let new_start = doc
            .change(&schema, |w| w.split_block(Position::new(0, 5)))
            .unwrap();

        assert_eq!(new_start, Position::new(1, 0));
        assert_eq!(doc.text(), "hello\n world");
        assert_eq!(doc.selection().focus, Position::new(1, 3));
    }

    #[test]
    fn insert_text_before_caret_pushes_caret() {
        let schema = schema();
        let mut doc = Document::from_blocks(vec![Block::paragraph("ab")]);
        doc.set_selection(Selection::collapsed(Position::new(0, 1)))
            .unwrap();
        doc.change(&schema, |w| w.insert_text("xy", Position::new(0, 0)).map(|_| ()))
            .unwrap();
        assert_eq!(doc.selection().focus, Position::new(0, 3));
    }
}
