use std::collections::BTreeMap;

pub type Attributes = BTreeMap<String, String>;

/// An atomic inline element (a reference, a mention...).
///
/// Elements carry their attributes from creation onwards; there is no
/// setter. Changing an attribute means replacing the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineElement {
    name: String,
    attributes: Attributes,
}

impl InlineElement {
    pub(crate) fn new(name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Inline content of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Element(InlineElement),
}

impl Inline {
    /// Length in model offsets: one per character, one per element.
    pub fn len(&self) -> usize {
        match self {
            Inline::Text(text) => text.chars().count(),
            Inline::Element(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A block (paragraph, code block) holding inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    name: String,
    children: Vec<Inline>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<Inline>) -> Self {
        let mut block = Self {
            name: name.into(),
            children,
        };
        block.normalize();
        block
    }

    pub fn paragraph(text: &str) -> Self {
        Self::with_children(
            crate::schema::PARAGRAPH,
            vec![Inline::Text(text.to_string())],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Inline] {
        &self.children
    }

    /// Length in model offsets.
    pub fn len(&self) -> usize {
        self.children.iter().map(Inline::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Concatenated text, elements skipped.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Inline::Text(text) => Some(text.as_str()),
                Inline::Element(_) => None,
            })
            .collect()
    }

    /// The element occupying `offset`, if any.
    pub fn element_at(&self, offset: usize) -> Option<&InlineElement> {
        self.elements()
            .find(|(at, _)| *at == offset)
            .map(|(_, element)| element)
    }

    /// Elements with their model offsets, in document order.
    pub fn elements(&self) -> impl Iterator<Item = (usize, &InlineElement)> {
        let mut offset = 0;
        self.children.iter().filter_map(move |child| {
            let at = offset;
            offset += child.len();
            match child {
                Inline::Element(element) => Some((at, element)),
                Inline::Text(_) => None,
            }
        })
    }

    pub(crate) fn insert(&mut self, offset: usize, inline: Inline) {
        let index = self.split_at(offset);
        self.children.insert(index, inline);
        self.normalize();
    }

    pub(crate) fn remove(&mut self, range: std::ops::Range<usize>) -> Vec<Inline> {
        let start = self.split_at(range.start);
        let end = self.split_at(range.end.max(range.start));
        let removed = self.children.drain(start..end).collect();
        self.normalize();
        removed
    }

    pub(crate) fn split_off(&mut self, offset: usize) -> Vec<Inline> {
        let index = self.split_at(offset);
        let tail = self.children.split_off(index);
        self.normalize();
        tail
    }

    pub(crate) fn append(&mut self, children: Vec<Inline>) {
        self.children.extend(children);
        self.normalize();
    }

    /// Splits a text run if needed so that `offset` falls on a child
    /// boundary; returns the index of the first child at or after it.
    fn split_at(&mut self, offset: usize) -> usize {
        let mut remaining = offset;
        let mut index = 0;
        while index < self.children.len() {
            if remaining == 0 {
                return index;
            }
            let len = self.children[index].len();
            if remaining < len {
                if let Inline::Text(text) = &mut self.children[index] {
                    let byte = char_to_byte(text, remaining);
                    let tail = text.split_off(byte);
                    self.children.insert(index + 1, Inline::Text(tail));
                }
                return index + 1;
            }
            remaining -= len;
            index += 1;
        }
        index
    }

    /// Merges adjacent text runs and drops empty ones.
    fn normalize(&mut self) {
        let mut merged: Vec<Inline> = Vec::with_capacity(self.children.len());
        for child in self.children.drain(..) {
            match child {
                Inline::Text(text) if text.is_empty() => {}
                Inline::Text(text) => {
                    if let Some(Inline::Text(previous)) = merged.last_mut() {
                        previous.push_str(&text);
                    } else {
                        merged.push(Inline::Text(text));
                    }
                }
                element => merged.push(element),
            }
        }
        self.children = merged;
    }
}

fn char_to_byte(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}
