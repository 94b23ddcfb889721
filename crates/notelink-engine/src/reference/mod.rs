/*!
 * # Reference Links
 *
 * Inline references to notes. A reference is an atomic inline element
 * with a single `targetPath` attribute; the note it points at is
 * identified by the last segment of that path.
 *
 * ## Representations
 *
 * - **Model**: a `reference` element, see [`ReferenceNode`]
 * - **Editing view**: a widget around an `<a>` whose text is filled in
 *   with the note title once the cache resolves it
 * - **Data**: `<a href="#path" class="reference-link" data-note-path="path">Title</a>`,
 *   titled only when the title is already cached
 *
 * ## Usage Pattern
 *
 * ```rust,no_run
 * use std::rc::Rc;
 * use notelink_engine::cache::{MemoryNoteSource, NoteCache};
 * use notelink_engine::editor::{CommandArgs, Editor};
 * use notelink_engine::reference::{COMMAND_NAME, ReferenceLink};
 *
 * # async fn run() -> Result<(), notelink_engine::editor::EditorError> {
 * let cache = Rc::new(NoteCache::new(Rc::new(
 *     MemoryNoteSource::new().with_note("roadmap", "Roadmap 2025"),
 * )));
 * let editor = Editor::new();
 * editor.use_plugin(&ReferenceLink::new(cache))?;
 *
 * editor
 *     .execute(COMMAND_NAME, CommandArgs::TargetPath("projects/roadmap".into()))
 *     .await?;
 * assert!(editor.get_data().contains("Roadmap 2025"));
 * # Ok(())
 * # }
 * ```
 */

pub mod command;
pub mod data_downcast;
pub mod editing_downcast;
pub mod schema;
pub mod upcast;

use std::rc::Rc;

use crate::cache::ResourceCache;
use crate::editing::{Document, InlineElement};
use crate::editor::{Editor, EditorError, Plugin};
use crate::view::{RenderAttributes, UiElement, WidgetSide};

pub use command::ReferenceLinkCommand;

/// Model element name.
pub const REFERENCE: &str = "reference";
/// The one attribute a reference carries.
pub const TARGET_PATH: &str = "targetPath";
/// Class marking a serialized anchor as a reference.
pub const MARKER_CLASS: &str = "reference-link";
pub const COMMAND_NAME: &str = "referenceLink";

/// Text after the last `/`; empty for a trailing slash.
pub fn last_segment(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, last)| last)
}

/// Typed view of a `reference` element.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceNode<'a> {
    element: &'a InlineElement,
}

impl<'a> ReferenceNode<'a> {
    pub fn from_element(element: &'a InlineElement) -> Option<Self> {
        (element.name() == REFERENCE).then_some(Self { element })
    }

    pub(crate) fn new(element: &'a InlineElement) -> Self {
        Self { element }
    }

    /// Empty when the reference was parsed without a path.
    pub fn target_path(&self) -> &'a str {
        self.element.attribute(TARGET_PATH).unwrap_or_default()
    }

    pub fn identifier(&self) -> &'a str {
        last_segment(self.target_path())
    }

    pub fn link_attributes(&self) -> RenderAttributes {
        let path = self.target_path();
        RenderAttributes::Link {
            href: format!("#{path}"),
            class: MARKER_CLASS,
            note_path: path.to_string(),
        }
    }
}

/// Identifiers of every referenced note, in document order, without
/// duplicates or empty identifiers.
pub fn referenced_identifiers(doc: &Document) -> Vec<String> {
    let mut identifiers: Vec<String> = Vec::new();
    for block in doc.blocks() {
        for (_, element) in block.elements() {
            let Some(node) = ReferenceNode::from_element(element) else {
                continue;
            };
            let identifier = node.identifier();
            if !identifier.is_empty() && !identifiers.iter().any(|known| known == identifier) {
                identifiers.push(identifier.to_string());
            }
        }
    }
    identifiers
}

fn map_inside_widget(ui: &UiElement, offset: usize) -> Option<WidgetSide> {
    ui.has_class(MARKER_CLASS).then_some(if offset == 0 {
        WidgetSide::Before
    } else {
        WidgetSide::After
    })
}

/// The reference link plugin.
pub struct ReferenceLink {
    cache: Rc<dyn ResourceCache>,
}

impl ReferenceLink {
    pub fn new(cache: Rc<dyn ResourceCache>) -> Self {
        Self { cache }
    }
}

impl Plugin for ReferenceLink {
    fn name(&self) -> &'static str {
        "ReferenceLink"
    }

    fn init(&self, editor: &Editor) -> Result<(), EditorError> {
        editor
            .schema_mut()
            .register(REFERENCE, schema::reference_definition())?;

        {
            let mut conversion = editor.conversion_mut();
            conversion.add_upcast(upcast::ReferenceUpcast);
            conversion.add_editing_downcast(
                REFERENCE,
                editing_downcast::ReferenceEditingDowncast::new(Rc::clone(&self.cache)),
            );
            conversion.add_data_downcast(
                REFERENCE,
                data_downcast::ReferenceDataDowncast::new(Rc::clone(&self.cache)),
            );
        }

        editor.add_mapper(Rc::new(map_inside_widget));
        editor.register_command(
            COMMAND_NAME,
            Rc::new(ReferenceLinkCommand::new(editor, Rc::clone(&self.cache))),
        );
        Ok(())
    }
}
