use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;

use crate::cache::ResourceCache;
use crate::editor::{Command, CommandArgs, Editor, EditorError, WeakEditor};
use crate::reference::{COMMAND_NAME, REFERENCE, TARGET_PATH, last_segment};

/// Inserts a reference at the selection.
///
/// Enabled when the schema allows a reference where the selection starts.
/// The referenced note is loaded into the cache before the insert, and the
/// insert happens at whatever the selection is once loading finishes.
pub struct ReferenceLinkCommand {
    editor: WeakEditor,
    cache: Rc<dyn ResourceCache>,
    enabled: Cell<bool>,
}

impl ReferenceLinkCommand {
    pub fn new(editor: &Editor, cache: Rc<dyn ResourceCache>) -> Self {
        Self {
            editor: editor.downgrade(),
            cache,
            enabled: Cell::new(false),
        }
    }

    /// Blank paths are ignored. Nothing here fails the caller: a note that
    /// cannot be loaded is inserted untitled, and an insert the document no
    /// longer accepts is logged and dropped.
    pub async fn insert(&self, target_path: &str) -> Result<(), EditorError> {
        if target_path.trim().is_empty() {
            log::debug!("ignoring reference insert with a blank path");
            return Ok(());
        }

        let identifier = last_segment(target_path);
        if identifier.is_empty() {
            log::debug!("reference `{target_path}` has no identifier, skipping cache warm-up");
        } else if let Err(err) = self.cache.ensure_loaded(identifier).await {
            log::warn!("inserting reference `{target_path}` without a cached note: {err}");
        }

        let Some(editor) = self.editor.upgrade() else {
            log::debug!("editor dropped before reference `{target_path}` could be inserted");
            return Ok(());
        };
        let inserted = editor.change(|writer| {
            let reference = writer.create_element(REFERENCE, [(TARGET_PATH, target_path)])?;
            let at = writer.insert_content(reference)?;
            writer.set_selection_after(at)?;
            Ok(at)
        });
        match inserted {
            Ok(at) => log::debug!("inserted reference `{target_path}` at {at:?}"),
            Err(err) => log::warn!("could not insert reference `{target_path}`: {err}"),
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl Command for ReferenceLinkCommand {
    fn refresh(&self, editor: &Editor) {
        let model = editor.model();
        let parent = model.parent_name(model.selection().start().parent);
        self.enabled
            .set(editor.schema().check_child(parent, REFERENCE));
    }

    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    async fn execute(&self, args: CommandArgs) -> Result<(), EditorError> {
        match args {
            CommandArgs::TargetPath(path) => self.insert(&path).await,
            CommandArgs::None => Err(EditorError::InvalidArguments {
                command: COMMAND_NAME.to_string(),
                reason: "expected a target path".to_string(),
            }),
        }
    }
}
