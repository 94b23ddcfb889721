// Test helpers shared by the integration tests - each test binary only
// uses some of them, so dead code analysis complains about the rest.
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use async_trait::async_trait;
use notelink_engine::cache::{CacheError, NoteMetadata, NoteSource};
use notelink_engine::view::UiElement;
use notelink_engine::{Editor, NoteCache, ReferenceLink};
use tokio::sync::watch;

/// A note source whose loads block until the test opens the note's gate.
#[derive(Default)]
pub struct GatedSource {
    titles: HashMap<String, String>,
    gates: RefCell<HashMap<String, watch::Sender<bool>>>,
    loads: Cell<usize>,
}

#[allow(dead_code)]
impl GatedSource {
    pub fn new(notes: &[(&str, &str)]) -> Rc<Self> {
        Rc::new(Self {
            titles: notes
                .iter()
                .map(|(id, title)| (id.to_string(), title.to_string()))
                .collect(),
            ..Default::default()
        })
    }

    /// Lets pending and future loads of `identifier` complete.
    pub fn release(&self, identifier: &str) {
        self.gate(identifier).send_replace(true);
    }

    pub fn loads(&self) -> usize {
        self.loads.get()
    }

    fn gate(&self, identifier: &str) -> watch::Sender<bool> {
        self.gates
            .borrow_mut()
            .entry(identifier.to_string())
            .or_insert_with(|| watch::channel(false).0)
            .clone()
    }
}

#[async_trait(?Send)]
impl NoteSource for GatedSource {
    async fn load(&self, identifier: &str) -> Result<NoteMetadata, CacheError> {
        self.loads.set(self.loads.get() + 1);
        let mut open = self.gate(identifier).subscribe();
        let _ = open.wait_for(|open| *open).await;
        self.titles
            .get(identifier)
            .map(|title| NoteMetadata {
                identifier: identifier.to_string(),
                title: title.clone(),
            })
            .ok_or_else(|| CacheError::NotFound(identifier.to_string()))
    }

    fn identifiers(&self) -> Result<Vec<String>, CacheError> {
        let mut identifiers: Vec<String> = self.titles.keys().cloned().collect();
        identifiers.sort();
        Ok(identifiers)
    }
}

#[allow(dead_code)]
pub fn gated_cache(notes: &[(&str, &str)]) -> (Rc<GatedSource>, Rc<NoteCache>) {
    let source = GatedSource::new(notes);
    let cache = Rc::new(NoteCache::new(source.clone()));
    (source, cache)
}

#[allow(dead_code)]
pub fn reference_editor(cache: Rc<NoteCache>) -> Editor {
    let editor = Editor::new();
    editor
        .use_plugin(&ReferenceLink::new(cache))
        .expect("plugin registers");
    editor
}

/// Runs `future` inside a `LocalSet` so widgets can spawn their updates.
#[allow(dead_code)]
pub async fn local<F: Future>(future: F) -> F::Output {
    tokio::task::LocalSet::new().run_until(future).await
}

/// Gives spawned background work a chance to run to completion.
#[allow(dead_code)]
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

#[allow(dead_code)]
pub fn widgets(editor: &Editor) -> Vec<UiElement> {
    editor.editing_view().widgets()
}

#[allow(dead_code)]
pub fn widget_texts(editor: &Editor) -> Vec<String> {
    widgets(editor).iter().map(UiElement::text).collect()
}

/// Waits for `done` to hold, for work that leaves the local task set
/// (file reads run on tokio's blocking pool).
#[allow(dead_code)]
pub async fn wait_until(done: impl Fn() -> bool) {
    for _ in 0..400 {
        if done() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("condition not met within two seconds");
}
