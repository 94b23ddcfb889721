//! Converter registry.
//!
//! Upcast converters turn parsed HTML elements into model content; editing
//! and data downcast converters project model elements into the editing
//! view and the serialized data respectively.

use std::collections::HashMap;
use std::rc::Rc;

use crate::editing::{Inline, InlineElement, ModelError, writer};
use crate::parsing::HtmlElement;
use crate::schema::Schema;
use crate::view::{DataNode, EditingDowncastContext, ViewInline};

/// Where an element is being upcast.
pub struct UpcastContext<'a> {
    schema: &'a Schema,
    parent: &'a str,
}

impl<'a> UpcastContext<'a> {
    pub fn new(schema: &'a Schema, parent: &'a str) -> Self {
        Self { schema, parent }
    }

    /// Schema name of the block receiving the content.
    pub fn parent(&self) -> &str {
        self.parent
    }

    pub fn allows(&self, child: &str) -> bool {
        self.schema.check_child(self.parent, child)
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
        writer::create_element(self.schema, name, attributes)
    }
}

pub trait UpcastConverter {
    /// Converts `element`, or returns `None` to leave it to other converters.
    fn upcast(&self, element: &HtmlElement, ctx: &UpcastContext<'_>) -> Option<Vec<Inline>>;
}

pub trait EditingDowncastConverter {
    fn downcast(&self, element: &InlineElement, ctx: &mut EditingDowncastContext<'_>)
    -> ViewInline;
}

/// Must not wait on anything: data output is produced synchronously.
pub trait DataDowncastConverter {
    fn downcast(&self, element: &InlineElement) -> DataNode;
}

#[derive(Default)]
pub struct Conversion {
    upcast: Vec<Rc<dyn UpcastConverter>>,
    editing: HashMap<String, Rc<dyn EditingDowncastConverter>>,
    data: HashMap<String, Rc<dyn DataDowncastConverter>>,
}

impl Conversion {
    pub fn add_upcast(&mut self, converter: impl UpcastConverter + 'static) {
        self.upcast.push(Rc::new(converter));
    }

    pub fn add_editing_downcast(
        &mut self,
        name: &str,
        converter: impl EditingDowncastConverter + 'static,
    ) {
        self.editing.insert(name.to_string(), Rc::new(converter));
    }

    pub fn add_data_downcast(&mut self, name: &str, converter: impl DataDowncastConverter + 'static) {
        self.data.insert(name.to_string(), Rc::new(converter));
    }

    /// Runs upcast converters, most recently added first, until one claims
    /// the element.
    pub fn upcast(&self, element: &HtmlElement, ctx: &UpcastContext<'_>) -> Option<Vec<Inline>> {
        self.upcast
            .iter()
            .rev()
            .find_map(|converter| converter.upcast(element, ctx))
    }

    pub fn editing_downcast(&self, name: &str) -> Option<Rc<dyn EditingDowncastConverter>> {
        self.editing.get(name).cloned()
    }

    pub fn data_downcast(&self, element: &InlineElement) -> Option<DataNode> {
        self.data
            .get(element.name())
            .map(|converter| converter.downcast(element))
    }
}
