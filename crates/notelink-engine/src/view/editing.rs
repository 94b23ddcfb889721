use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::{Rc, Weak};

use tokio::task::AbortHandle;

use crate::conversion::Conversion;
use crate::editing::{Block, Document, Inline, Position};
use crate::view::element::{self, DomElement, RenderAttributes, UiElement, WidgetId};

/// Inline content of a rendered block.
#[derive(Debug, Clone)]
pub enum ViewInline {
    Text(String),
    Ui(UiElement),
    /// An element nothing knows how to render.
    Placeholder(String),
}

impl ViewInline {
    /// Length in model offsets.
    fn model_len(&self) -> usize {
        match self {
            ViewInline::Text(text) => text.chars().count(),
            ViewInline::Ui(_) | ViewInline::Placeholder(_) => 1,
        }
    }
}

#[derive(Debug)]
pub struct ViewBlock {
    source: Block,
    children: Vec<ViewInline>,
}

impl ViewBlock {
    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn children(&self) -> &[ViewInline] {
        &self.children
    }

    fn widgets(&self) -> impl Iterator<Item = &UiElement> {
        self.children.iter().filter_map(|child| match child {
            ViewInline::Ui(ui) => Some(ui),
            _ => None,
        })
    }
}

/// A position in the editing view: an offset inside one child of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewPosition {
    pub block: usize,
    pub child: usize,
    pub offset: usize,
}

/// Which side of a widget a view position maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetSide {
    Before,
    After,
}

/// Claims view positions inside a UI element.
pub type Mapper = Rc<dyn Fn(&UiElement, usize) -> Option<WidgetSide>>;

struct LiveWidget {
    dom: Weak<RefCell<DomElement>>,
    task: Option<AbortHandle>,
}

/// Tracks which rendered UI elements are still part of the view.
///
/// Background updates look their element up here by id and are dropped if
/// it has been torn down in the meantime.
#[derive(Default)]
pub struct WidgetRegistry {
    live: RefCell<HashMap<WidgetId, LiveWidget>>,
    next_id: Cell<u64>,
}

impl WidgetRegistry {
    pub fn is_live(&self, id: WidgetId) -> bool {
        self.live.borrow().contains_key(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    /// Replaces the text of a live element. Returns whether anything was
    /// patched.
    pub fn patch_text(&self, id: WidgetId, text: &str) -> bool {
        let dom = self
            .live
            .borrow_mut()
            .get_mut(&id)
            .and_then(|widget| {
                widget.task = None;
                widget.dom.upgrade()
            });
        match dom {
            Some(dom) => {
                element::set_text(&dom, text);
                true
            }
            None => {
                log::debug!("dropping update for widget {id:?}: no longer rendered");
                false
            }
        }
    }

    fn register(&self, tag: &'static str, attributes: RenderAttributes, text: String) -> UiElement {
        let id = WidgetId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let ui = UiElement::new(id, tag, attributes, text);
        self.live.borrow_mut().insert(
            id,
            LiveWidget {
                dom: ui.downgrade(),
                task: None,
            },
        );
        ui
    }

    fn attach_task(&self, id: WidgetId, task: AbortHandle) {
        match self.live.borrow_mut().get_mut(&id) {
            Some(widget) => widget.task = Some(task),
            None => task.abort(),
        }
    }

    fn tear_down(&self, ui: &UiElement) {
        ui.detach();
        if let Some(widget) = self.live.borrow_mut().remove(&ui.id())
            && let Some(task) = widget.task
        {
            task.abort();
        }
    }
}

/// Handed to editing downcast converters while a block is rendered.
pub struct EditingDowncastContext<'a> {
    registry: &'a Rc<WidgetRegistry>,
}

impl EditingDowncastContext<'_> {
    pub fn create_ui_element(
        &mut self,
        tag: &'static str,
        attributes: RenderAttributes,
        text: impl Into<String>,
    ) -> UiElement {
        self.registry.register(tag, attributes, text.into())
    }

    /// Marks an element as a widget: atomic under selection.
    pub fn to_widget(&self, mut ui: UiElement) -> UiElement {
        ui.mark_widget();
        ui
    }

    /// Runs `update` in the background and writes its output into `ui`
    /// if the element is still rendered by then. Must be called from
    /// within a [`tokio::task::LocalSet`]; with no runtime at all the
    /// update is skipped and `ui` keeps its initial text.
    pub fn spawn_update<F>(&self, ui: &UiElement, update: F)
    where
        F: Future<Output = Option<String>> + 'static,
    {
        let id = ui.id();
        if tokio::runtime::Handle::try_current().is_err() {
            log::warn!("no async runtime, skipping background update for widget {id:?}");
            return;
        }
        let registry = Rc::downgrade(self.registry);
        let handle = tokio::task::spawn_local(async move {
            let Some(text) = update.await else {
                return;
            };
            match registry.upgrade() {
                Some(registry) => {
                    registry.patch_text(id, &text);
                }
                None => log::debug!("dropping update for widget {id:?}: view is gone"),
            }
        });
        self.registry.attach_task(id, handle.abort_handle());
    }
}

/// The interactive projection of a document.
pub struct EditingView {
    blocks: Vec<ViewBlock>,
    registry: Rc<WidgetRegistry>,
    mappers: Vec<Mapper>,
}

impl Default for EditingView {
    fn default() -> Self {
        Self::new()
    }
}

impl EditingView {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            registry: Rc::new(WidgetRegistry::default()),
            mappers: Vec::new(),
        }
    }

    pub fn blocks(&self) -> &[ViewBlock] {
        &self.blocks
    }

    pub fn registry(&self) -> &Rc<WidgetRegistry> {
        &self.registry
    }

    /// All rendered UI elements in document order.
    pub fn widgets(&self) -> Vec<UiElement> {
        self.blocks
            .iter()
            .flat_map(|block| block.widgets())
            .cloned()
            .collect()
    }

    pub fn add_mapper(&mut self, mapper: Mapper) {
        self.mappers.push(mapper);
    }

    /// Brings the view in line with `doc`.
    ///
    /// A block whose model content is unchanged keeps its rendered view,
    /// including pending background updates. Every other block is rendered
    /// afresh and the widgets it replaces are torn down.
    pub fn render(&mut self, doc: &Document, conversion: &Conversion) {
        let mut previous: Vec<Option<ViewBlock>> = self.blocks.drain(..).map(Some).collect();
        let mut rendered = Vec::with_capacity(doc.blocks().len());

        for (index, block) in doc.blocks().iter().enumerate() {
            let reuse = match previous.get(index) {
                Some(Some(old)) if old.source == *block => Some(index),
                _ => previous
                    .iter()
                    .position(|old| old.as_ref().is_some_and(|old| old.source == *block)),
            };
            match reuse.and_then(|at| previous[at].take()) {
                Some(view) => rendered.push(view),
                None => rendered.push(self.render_block(block, conversion)),
            }
        }

        for stale in previous.into_iter().flatten() {
            for ui in stale.widgets() {
                self.registry.tear_down(ui);
            }
        }
        self.blocks = rendered;
    }

    fn render_block(&self, block: &Block, conversion: &Conversion) -> ViewBlock {
        let mut ctx = EditingDowncastContext {
            registry: &self.registry,
        };
        let children = block
            .children()
            .iter()
            .map(|child| match child {
                Inline::Text(text) => ViewInline::Text(text.clone()),
                Inline::Element(element) => match conversion.editing_downcast(element.name()) {
                    Some(converter) => converter.downcast(element, &mut ctx),
                    None => {
                        log::debug!("no editing converter for `{}`", element.name());
                        ViewInline::Placeholder(element.name().to_string())
                    }
                },
            })
            .collect();
        ViewBlock {
            source: block.clone(),
            children,
        }
    }

    /// Maps a view position to the model.
    ///
    /// Positions inside a UI element are resolved by the registered
    /// mappers; `None` if no mapper claims it.
    pub fn to_model_position(&self, position: ViewPosition) -> Option<Position> {
        let block = self.blocks.get(position.block)?;
        let base: usize = block
            .children
            .iter()
            .take(position.child)
            .map(ViewInline::model_len)
            .sum();

        let offset = match block.children.get(position.child) {
            None => base,
            Some(ViewInline::Text(text)) => base + position.offset.min(text.chars().count()),
            Some(ViewInline::Placeholder(_)) => base,
            Some(ViewInline::Ui(ui)) => {
                let side = self
                    .mappers
                    .iter()
                    .find_map(|mapper| mapper(ui, position.offset))?;
                match side {
                    WidgetSide::Before => base,
                    WidgetSide::After => base + 1,
                }
            }
        };
        Some(Position::new(position.block, offset))
    }
}

impl Drop for EditingView {
    fn drop(&mut self) {
        for block in &self.blocks {
            for ui in block.widgets() {
                self.registry.tear_down(ui);
            }
        }
    }
}
