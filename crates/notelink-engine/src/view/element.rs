use std::cell::RefCell;
use std::rc::Rc;

pub const HREF: &str = "href";
pub const CLASS: &str = "class";
pub const DATA_NOTE_PATH: &str = "data-note-path";

/// Identity of a rendered UI element, unique per editing view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub(crate) u64);

/// The attributes a rendered element may carry.
///
/// Only link-shaped elements are rendered, so the set is closed rather than
/// an open key/value map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderAttributes {
    #[default]
    None,
    Link {
        href: String,
        class: &'static str,
        note_path: String,
    },
}

impl RenderAttributes {
    /// Attribute name/value pairs in output order.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        match self {
            RenderAttributes::None => Vec::new(),
            RenderAttributes::Link {
                href,
                class,
                note_path,
            } => vec![(HREF, href), (CLASS, class), (DATA_NOTE_PATH, note_path)],
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

/// The live node behind a [`UiElement`]; what a browser would call the DOM
/// element.
#[derive(Debug)]
pub struct DomElement {
    tag: &'static str,
    attributes: RenderAttributes,
    text: String,
    attached: bool,
}

impl DomElement {
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn attributes(&self) -> &RenderAttributes {
        &self.attributes
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

/// A UI element in the editing view whose content is managed outside the
/// model, e.g. a reference link whose text is filled in later.
#[derive(Debug, Clone)]
pub struct UiElement {
    id: WidgetId,
    dom: Rc<RefCell<DomElement>>,
    widget: bool,
}

impl UiElement {
    pub(crate) fn new(
        id: WidgetId,
        tag: &'static str,
        attributes: RenderAttributes,
        text: String,
    ) -> Self {
        Self {
            id,
            dom: Rc::new(RefCell::new(DomElement {
                tag,
                attributes,
                text,
                attached: true,
            })),
            widget: false,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn tag(&self) -> &'static str {
        self.dom.borrow().tag
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.dom.borrow().attributes.get(name).map(str::to_string)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute(CLASS)
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn text(&self) -> String {
        self.dom.borrow().text.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.dom.borrow().attached
    }

    /// Widgets are selected, moved over and deleted as one unit.
    pub fn is_widget(&self) -> bool {
        self.widget
    }

    pub(crate) fn mark_widget(&mut self) {
        self.widget = true;
    }

    pub(crate) fn downgrade(&self) -> std::rc::Weak<RefCell<DomElement>> {
        Rc::downgrade(&self.dom)
    }

    pub(crate) fn detach(&self) {
        self.dom.borrow_mut().attached = false;
    }
}

pub(crate) fn set_text(dom: &RefCell<DomElement>, text: &str) {
    dom.borrow_mut().text = text.to_string();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> RenderAttributes {
        RenderAttributes::Link {
            href: "#a/b".into(),
            class: "reference-link",
            note_path: "a/b".into(),
        }
    }

    #[test]
    fn link_attributes_render_in_fixed_order() {
        assert_eq!(
            link().pairs(),
            vec![
                (HREF, "#a/b"),
                (CLASS, "reference-link"),
                (DATA_NOTE_PATH, "a/b")
            ]
        );
        assert!(RenderAttributes::None.pairs().is_empty());
    }

    #[test]
    fn ui_element_exposes_dom_state() {
        let mut ui = UiElement::new(WidgetId(7), "a", link(), String::new());
        assert_eq!(ui.tag(), "a");
        assert!(ui.has_class("reference-link"));
        assert_eq!(ui.attribute(DATA_NOTE_PATH).as_deref(), Some("a/b"));
        assert!(!ui.is_widget());
        ui.mark_widget();
        assert!(ui.is_widget());

        set_text(&ui.dom, "Title");
        assert_eq!(ui.text(), "Title");

        ui.detach();
        assert!(!ui.is_attached());
    }
}
