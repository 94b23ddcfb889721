use crate::conversion::{UpcastContext, UpcastConverter};
use crate::editing::Inline;
use crate::parsing::HtmlElement;
use crate::reference::{MARKER_CLASS, REFERENCE, TARGET_PATH};
use crate::view::DATA_NOTE_PATH;

/// `<a class="reference-link" data-note-path="...">` to a `reference`.
///
/// Anchors without the marker class are left to other converters. A
/// missing `data-note-path` gives a reference with an empty path. Where the
/// schema does not allow a reference the anchor becomes its text.
pub(crate) struct ReferenceUpcast;

impl UpcastConverter for ReferenceUpcast {
    fn upcast(&self, element: &HtmlElement, ctx: &UpcastContext<'_>) -> Option<Vec<Inline>> {
        if element.name != "a" || !element.has_class(MARKER_CLASS) {
            return None;
        }

        if !ctx.allows(REFERENCE) {
            log::debug!(
                "reference not allowed in `{}`, keeping its text",
                ctx.parent()
            );
            let text = element.text_content();
            return Some(if text.is_empty() {
                Vec::new()
            } else {
                vec![Inline::Text(text)]
            });
        }

        let target_path = element.attribute(DATA_NOTE_PATH).unwrap_or_else(|| {
            log::debug!("reference link without {DATA_NOTE_PATH}");
            ""
        });
        match ctx.create_element(REFERENCE, [(TARGET_PATH, target_path)]) {
            Ok(reference) => Some(vec![Inline::Element(reference)]),
            Err(err) => {
                log::warn!("could not create reference: {err}");
                None
            }
        }
    }
}
