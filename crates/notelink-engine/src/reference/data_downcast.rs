use std::rc::Rc;

use crate::cache::ResourceCache;
use crate::conversion::DataDowncastConverter;
use crate::editing::InlineElement;
use crate::reference::ReferenceNode;
use crate::view::{DataElement, DataNode};

/// Serializes a reference as an anchor, titled only from the cache as it
/// is right now.
pub(crate) struct ReferenceDataDowncast {
    cache: Rc<dyn ResourceCache>,
}

impl ReferenceDataDowncast {
    pub(crate) fn new(cache: Rc<dyn ResourceCache>) -> Self {
        Self { cache }
    }
}

impl DataDowncastConverter for ReferenceDataDowncast {
    fn downcast(&self, element: &InlineElement) -> DataNode {
        let node = ReferenceNode::new(element);
        let title = match node.identifier() {
            "" => None,
            identifier => self.cache.get_from_cache_sync(identifier),
        };
        DataNode::Element(DataElement {
            tag: "a",
            attributes: node.link_attributes(),
            children: title
                .map(|metadata| DataNode::Text(metadata.title))
                .into_iter()
                .collect(),
        })
    }
}
