use std::rc::Rc;

use crate::cache::ResourceCache;
use crate::conversion::EditingDowncastConverter;
use crate::editing::InlineElement;
use crate::reference::ReferenceNode;
use crate::view::{EditingDowncastContext, ViewInline};

/// Renders a reference as a link widget with empty text, then fills the
/// title in once the cache resolves it.
///
/// Each render starts its own resolution. If the widget is torn down first
/// the update is dropped; a failed resolution leaves the text empty.
pub(crate) struct ReferenceEditingDowncast {
    cache: Rc<dyn ResourceCache>,
}

impl ReferenceEditingDowncast {
    pub(crate) fn new(cache: Rc<dyn ResourceCache>) -> Self {
        Self { cache }
    }
}

impl EditingDowncastConverter for ReferenceEditingDowncast {
    fn downcast(&self, element: &InlineElement, ctx: &mut EditingDowncastContext<'_>) -> ViewInline {
        let node = ReferenceNode::new(element);
        let link = ctx.create_ui_element("a", node.link_attributes(), "");
        let widget = ctx.to_widget(link);

        let identifier = node.identifier().to_string();
        if identifier.is_empty() {
            log::debug!("reference `{}` has no identifier, not resolving", node.target_path());
            return ViewInline::Ui(widget);
        }

        let cache = Rc::clone(&self.cache);
        ctx.spawn_update(&widget, async move {
            match cache.resolve_title(&identifier).await {
                Ok(title) => {
                    log::debug!("resolved `{identifier}` to {title:?}");
                    Some(title)
                }
                Err(err) => {
                    log::debug!("leaving reference `{identifier}` untitled: {err}");
                    None
                }
            }
        });
        ViewInline::Ui(widget)
    }
}
