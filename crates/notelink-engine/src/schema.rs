//! # Schema
//!
//! Declares which model items exist, where each may appear and which
//! attributes it may carry. Generic items (`$root`, `$block`, `$text`) give
//! concrete items something to inherit from or be placed next to:
//!
//! - `allow_in`: parents an item may be a child of
//! - `allow_where`: "wherever this other item is allowed" (e.g. `$text`)
//! - `inherit`: the item behaves like the named generic item, both as a
//!   child and as a parent
//! - `text_only`: the item only admits `$text` children

use std::collections::HashMap;

/// Generic root item.
pub const ROOT: &str = "$root";
/// Generic block item.
pub const BLOCK: &str = "$block";
/// Generic text item.
pub const TEXT: &str = "$text";
/// Paragraph block.
pub const PARAGRAPH: &str = "paragraph";
/// Preformatted block that only admits plain text.
pub const CODE_BLOCK: &str = "codeBlock";

/// Nesting depth at which rule resolution gives up (guards against cycles).
const MAX_RULE_DEPTH: usize = 16;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema item `{0}` is already registered")]
    AlreadyRegistered(String),
}

/// Registration rules for a single schema item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaItemDefinition {
    pub allow_in: Vec<String>,
    pub allow_where: Option<String>,
    pub inherit: Vec<String>,
    pub allow_attributes: Vec<String>,
    pub is_inline: bool,
    pub is_object: bool,
    pub is_block: bool,
    pub is_limit: bool,
    pub text_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    items: HashMap<String, SchemaItemDefinition>,
}

impl Schema {
    /// An empty schema with no items at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// A schema with the generic items plus `paragraph` and `codeBlock`.
    pub fn with_builtins() -> Self {
        let mut schema = Self::new();
        let builtins = [
            (
                ROOT,
                SchemaItemDefinition {
                    is_limit: true,
                    ..Default::default()
                },
            ),
            (
                BLOCK,
                SchemaItemDefinition {
                    allow_in: vec![ROOT.to_string()],
                    is_block: true,
                    ..Default::default()
                },
            ),
            (
                TEXT,
                SchemaItemDefinition {
                    allow_in: vec![BLOCK.to_string()],
                    is_inline: true,
                    ..Default::default()
                },
            ),
            (
                PARAGRAPH,
                SchemaItemDefinition {
                    inherit: vec![BLOCK.to_string()],
                    is_block: true,
                    ..Default::default()
                },
            ),
            (
                CODE_BLOCK,
                SchemaItemDefinition {
                    inherit: vec![BLOCK.to_string()],
                    is_block: true,
                    text_only: true,
                    ..Default::default()
                },
            ),
        ];
        for (name, definition) in builtins {
            schema.items.insert(name.to_string(), definition);
        }
        schema
    }

    pub fn register(
        &mut self,
        name: &str,
        definition: SchemaItemDefinition,
    ) -> Result<(), SchemaError> {
        if self.items.contains_key(name) {
            return Err(SchemaError::AlreadyRegistered(name.to_string()));
        }
        log::debug!("registering schema item `{name}`");
        self.items.insert(name.to_string(), definition);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn definition(&self, name: &str) -> Option<&SchemaItemDefinition> {
        self.items.get(name)
    }

    pub fn is_inline(&self, name: &str) -> bool {
        self.items.get(name).is_some_and(|d| d.is_inline)
    }

    pub fn is_object(&self, name: &str) -> bool {
        self.items.get(name).is_some_and(|d| d.is_object)
    }

    pub fn is_block(&self, name: &str) -> bool {
        self.items.get(name).is_some_and(|d| d.is_block)
    }

    pub fn is_limit(&self, name: &str) -> bool {
        self.items.get(name).is_some_and(|d| d.is_limit)
    }

    /// Whether `attribute` may be set on `item`.
    pub fn check_attribute(&self, item: &str, attribute: &str) -> bool {
        self.items
            .get(item)
            .is_some_and(|d| d.allow_attributes.iter().any(|a| a == attribute))
    }

    /// Whether `child` may be placed directly inside `parent`.
    pub fn check_child(&self, parent: &str, child: &str) -> bool {
        let Some(parent_definition) = self.items.get(parent) else {
            return false;
        };
        if !self.items.contains_key(child) {
            return false;
        }
        if parent_definition.text_only && child != TEXT {
            return false;
        }

        let mut allowed = Vec::new();
        self.collect_allowed_parents(child, 0, &mut allowed);
        allowed
            .iter()
            .any(|candidate| self.is_a(parent, candidate, 0))
    }

    /// Collects every parent name `item` is allowed in, following
    /// `allow_where` and `inherit` links.
    fn collect_allowed_parents<'a>(&'a self, item: &str, depth: usize, out: &mut Vec<&'a str>) {
        if depth > MAX_RULE_DEPTH {
            return;
        }
        let Some(definition) = self.items.get(item) else {
            return;
        };
        out.extend(definition.allow_in.iter().map(String::as_str));
        if let Some(target) = &definition.allow_where {
            self.collect_allowed_parents(target, depth + 1, out);
        }
        for base in &definition.inherit {
            self.collect_allowed_parents(base, depth + 1, out);
        }
    }

    /// Whether `name` is `target` or inherits from it.
    fn is_a(&self, name: &str, target: &str, depth: usize) -> bool {
        if name == target {
            return true;
        }
        if depth > MAX_RULE_DEPTH {
            return false;
        }
        self.items.get(name).is_some_and(|d| {
            d.inherit
                .iter()
                .any(|base| self.is_a(base, target, depth + 1))
        })
    }
}
