//! The editor handle that plugins are initialised with.
//!
//! [`Editor`] owns the schema, the document, the converter registry, the
//! editing view and the registered commands. It is a cheap, clonable
//! handle; commands that must reach the editor after an `.await` hold a
//! [`WeakEditor`] instead.
//!
//! Rendering the editing view may spawn background tasks with
//! [`tokio::task::spawn_local`], so every call that changes the document
//! must run inside a [`tokio::task::LocalSet`].

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use async_trait::async_trait;

use crate::conversion::Conversion;
use crate::editing::{Cmd, Document, ModelError, Patch, Selection, Writer};
use crate::schema::{Schema, SchemaError};
use crate::view::{DataProcessor, EditingView, Mapper};

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("no command named `{0}`")]
    UnknownCommand(String),
    #[error("invalid arguments for `{command}`: {reason}")]
    InvalidArguments { command: String, reason: String },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Arguments passed to [`Editor::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandArgs {
    None,
    TargetPath(String),
}

/// Extends an editor with schema items, converters and commands.
pub trait Plugin {
    fn name(&self) -> &'static str;

    fn init(&self, editor: &Editor) -> Result<(), EditorError>;
}

#[async_trait(?Send)]
pub trait Command {
    /// Recomputes command state from the current document and selection.
    fn refresh(&self, editor: &Editor);

    fn is_enabled(&self) -> bool;

    async fn execute(&self, args: CommandArgs) -> Result<(), EditorError>;
}

struct EditorInner {
    schema: RefCell<Schema>,
    model: RefCell<Document>,
    conversion: RefCell<Conversion>,
    editing: RefCell<EditingView>,
    commands: RefCell<BTreeMap<String, Rc<dyn Command>>>,
}

#[derive(Clone)]
pub struct Editor {
    inner: Rc<EditorInner>,
}

#[derive(Clone)]
pub struct WeakEditor {
    inner: Weak<EditorInner>,
}

impl WeakEditor {
    pub fn upgrade(&self) -> Option<Editor> {
        self.inner.upgrade().map(|inner| Editor { inner })
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// An editor with the built-in schema and an empty paragraph.
    pub fn new() -> Self {
        let editor = Self {
            inner: Rc::new(EditorInner {
                schema: RefCell::new(Schema::with_builtins()),
                model: RefCell::new(Document::new()),
                conversion: RefCell::new(Conversion::default()),
                editing: RefCell::new(EditingView::new()),
                commands: RefCell::new(BTreeMap::new()),
            }),
        };
        editor.render();
        editor
    }

    pub fn use_plugin(&self, plugin: &dyn Plugin) -> Result<(), EditorError> {
        log::debug!("initialising plugin {}", plugin.name());
        plugin.init(self)?;
        self.render();
        self.refresh_commands();
        Ok(())
    }

    pub fn downgrade(&self) -> WeakEditor {
        WeakEditor {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn schema(&self) -> Ref<'_, Schema> {
        self.inner.schema.borrow()
    }

    pub fn schema_mut(&self) -> RefMut<'_, Schema> {
        self.inner.schema.borrow_mut()
    }

    pub fn conversion_mut(&self) -> RefMut<'_, Conversion> {
        self.inner.conversion.borrow_mut()
    }

    pub fn model(&self) -> Ref<'_, Document> {
        self.inner.model.borrow()
    }

    pub fn editing_view(&self) -> Ref<'_, EditingView> {
        self.inner.editing.borrow()
    }

    pub fn add_mapper(&self, mapper: Mapper) {
        self.inner.editing.borrow_mut().add_mapper(mapper);
    }

    pub fn register_command(&self, name: &str, command: Rc<dyn Command>) {
        self.inner
            .commands
            .borrow_mut()
            .insert(name.to_string(), command);
    }

    pub fn command(&self, name: &str) -> Option<Rc<dyn Command>> {
        self.inner.commands.borrow().get(name).cloned()
    }

    /// Refreshes the command and runs it if it is enabled. A disabled
    /// command is skipped without error.
    pub async fn execute(&self, name: &str, args: CommandArgs) -> Result<(), EditorError> {
        let command = self
            .command(name)
            .ok_or_else(|| EditorError::UnknownCommand(name.to_string()))?;
        command.refresh(self);
        if !command.is_enabled() {
            log::debug!("command `{name}` is disabled, ignoring");
            return Ok(());
        }
        command.execute(args).await
    }

    pub fn refresh_commands(&self) {
        let commands: Vec<_> = self.inner.commands.borrow().values().cloned().collect();
        for command in commands {
            command.refresh(self);
        }
    }

    /// Runs `f` as one atomic, undoable model change.
    pub fn change<R>(
        &self,
        f: impl FnOnce(&mut Writer<'_>) -> Result<R, ModelError>,
    ) -> Result<R, EditorError> {
        let value = {
            let schema = self.inner.schema.borrow();
            self.inner.model.borrow_mut().change(&schema, f)?
        };
        self.after_change();
        Ok(value)
    }

    pub fn apply(&self, cmd: Cmd) -> Result<Patch, EditorError> {
        let patch = {
            let schema = self.inner.schema.borrow();
            self.inner.model.borrow_mut().apply(&schema, cmd)?
        };
        self.after_change();
        Ok(patch)
    }

    pub fn set_selection(&self, selection: Selection) -> Result<(), EditorError> {
        self.inner.model.borrow_mut().set_selection(selection)?;
        self.refresh_commands();
        Ok(())
    }

    pub fn undo(&self) -> bool {
        let undone = self.inner.model.borrow_mut().undo();
        if undone {
            self.after_change();
        }
        undone
    }

    pub fn redo(&self) -> bool {
        let redone = self.inner.model.borrow_mut().redo();
        if redone {
            self.after_change();
        }
        redone
    }

    /// Replaces the document with parsed `data`.
    pub fn set_data(&self, data: &str) {
        let blocks = {
            let schema = self.inner.schema.borrow();
            let conversion = self.inner.conversion.borrow();
            DataProcessor::new(&schema, &conversion).from_data(data)
        };
        log::debug!("loaded {} blocks", blocks.len());
        self.inner.model.borrow_mut().reset(blocks);
        self.after_change();
    }

    /// Serializes the document. Never waits on pending background work.
    pub fn get_data(&self) -> String {
        let schema = self.inner.schema.borrow();
        let conversion = self.inner.conversion.borrow();
        let model = self.inner.model.borrow();
        DataProcessor::new(&schema, &conversion).to_data(&model)
    }

    fn after_change(&self) {
        self.render();
        self.refresh_commands();
    }

    fn render(&self) {
        let model = self.inner.model.borrow();
        let conversion = self.inner.conversion.borrow();
        self.inner.editing.borrow_mut().render(&model, &conversion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{Block, Position};
    use std::cell::Cell;

    #[derive(Default)]
    struct Counter {
        refreshed: Cell<usize>,
        enabled: Cell<bool>,
        runs: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl Command for Counter {
        fn refresh(&self, _: &Editor) {
            self.refreshed.set(self.refreshed.get() + 1);
        }

        fn is_enabled(&self) -> bool {
            self.enabled.get()
        }

        async fn execute(&self, _: CommandArgs) -> Result<(), EditorError> {
            self.runs.set(self.runs.get() + 1);
            Ok(())
        }
    }

    #[tokio::test]
    async fn disabled_commands_are_skipped() {
        let editor = Editor::new();
        let counter = Rc::new(Counter::default());
        editor.register_command("count", counter.clone());

        editor.execute("count", CommandArgs::None).await.unwrap();
        assert_eq!(counter.runs.get(), 0);

        counter.enabled.set(true);
        editor.execute("count", CommandArgs::None).await.unwrap();
        assert_eq!(counter.runs.get(), 1);
    }

    #[tokio::test]
    async fn unknown_command_is_an_error() {
        let editor = Editor::new();
        let result = editor.execute("nope", CommandArgs::None).await;
        assert!(matches!(result, Err(EditorError::UnknownCommand(name)) if name == "nope"));
    }

    #[test]
    fn selection_changes_refresh_commands() {
        let editor = Editor::new();
        editor.set_data("<p>abc</p>");
        let counter = Rc::new(Counter::default());
        editor.register_command("count", counter.clone());

        editor
            .set_selection(Selection::collapsed(Position::new(0, 2)))
            .unwrap();
        editor.apply(Cmd::MoveLeft).unwrap();
        assert_eq!(counter.refreshed.get(), 2);
        assert_eq!(editor.model().selection().focus, Position::new(0, 1));
    }

    #[test]
    fn failed_change_leaves_document_untouched() {
        let editor = Editor::new();
        editor.set_data("<p>abc</p>");
        let version = editor.model().version();

        let result = editor.change(|w| {
            w.insert_text("x", Position::new(0, 0))?;
            w.insert_text("y", Position::new(3, 0))
        });

        assert!(matches!(result, Err(EditorError::Model(_))));
        assert_eq!(editor.model().blocks(), &[Block::paragraph("abc")]);
        assert_eq!(editor.model().version(), version);
    }

    #[test]
    fn weak_handle_does_not_keep_editor_alive() {
        let editor = Editor::new();
        let weak = editor.downgrade();
        assert!(weak.upgrade().is_some());
        drop(editor);
        assert!(weak.upgrade().is_none());
    }
}
