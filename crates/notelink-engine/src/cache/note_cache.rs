use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared, join_all};

use crate::cache::{CacheError, NoteMetadata, NoteSource, ResourceCache};

type SharedFetch = Shared<LocalBoxFuture<'static, Result<NoteMetadata, CacheError>>>;

#[derive(Default)]
struct CacheState {
    entries: RefCell<HashMap<String, NoteMetadata>>,
    in_flight: RefCell<HashMap<String, SharedFetch>>,
    fetch_count: Cell<usize>,
}

/// The standard [`ResourceCache`].
///
/// Concurrent requests for the same identifier share one fetch. Failed
/// fetches are logged and not remembered, so the next request retries.
pub struct NoteCache {
    source: Rc<dyn NoteSource>,
    state: Rc<CacheState>,
}

impl NoteCache {
    pub fn new(source: Rc<dyn NoteSource>) -> Self {
        Self {
            source,
            state: Rc::new(CacheState::default()),
        }
    }

    /// Seeds the cache without a fetch.
    pub fn insert(&self, metadata: NoteMetadata) {
        self.state
            .entries
            .borrow_mut()
            .insert(metadata.identifier.clone(), metadata);
    }

    pub fn len(&self) -> usize {
        self.state.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fetches started against the source so far.
    pub fn fetch_count(&self) -> usize {
        self.state.fetch_count.get()
    }

    /// Loads every note the source knows about; returns how many loaded.
    pub async fn preload(&self) -> Result<usize, CacheError> {
        let identifiers = self.source.identifiers()?;
        let results = join_all(identifiers.iter().map(|id| self.ensure_loaded(id))).await;
        let loaded = results.iter().filter(|result| result.is_ok()).count();
        log::info!("preloaded {loaded} of {} notes", identifiers.len());
        Ok(loaded)
    }

    fn fetch(&self, identifier: &str) -> SharedFetch {
        if let Some(pending) = self.state.in_flight.borrow().get(identifier) {
            log::trace!("joining in-flight fetch for `{identifier}`");
            return pending.clone();
        }

        log::debug!("fetching note `{identifier}`");
        self.state.fetch_count.set(self.state.fetch_count.get() + 1);
        let source = Rc::clone(&self.source);
        let state = Rc::downgrade(&self.state);
        let id = identifier.to_string();
        let fetch = async move {
            let result = source.load(&id).await;
            if let Some(state) = state.upgrade() {
                state.in_flight.borrow_mut().remove(&id);
                match &result {
                    Ok(metadata) => {
                        state
                            .entries
                            .borrow_mut()
                            .insert(id.clone(), metadata.clone());
                    }
                    Err(err) => log::warn!("could not load note `{id}`: {err}"),
                }
            }
            result
        }
        .boxed_local()
        .shared();

        self.state
            .in_flight
            .borrow_mut()
            .insert(identifier.to_string(), fetch.clone());
        fetch
    }
}

#[async_trait(?Send)]
impl ResourceCache for NoteCache {
    async fn ensure_loaded(&self, identifier: &str) -> Result<(), CacheError> {
        if self.state.entries.borrow().contains_key(identifier) {
            return Ok(());
        }
        self.fetch(identifier).await.map(|_| ())
    }

    fn get_from_cache_sync(&self, identifier: &str) -> Option<NoteMetadata> {
        self.state.entries.borrow().get(identifier).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryNoteSource;
    use pretty_assertions::assert_eq;

    /// Yields once per load so that concurrent callers overlap.
    struct SlowSource {
        inner: MemoryNoteSource,
        loads: Cell<usize>,
        failures_left: Cell<usize>,
    }

    impl SlowSource {
        fn new(inner: MemoryNoteSource) -> Self {
            Self {
                inner,
                loads: Cell::new(0),
                failures_left: Cell::new(0),
            }
        }
    }

    #[async_trait(?Send)]
    impl NoteSource for SlowSource {
        async fn load(&self, identifier: &str) -> Result<NoteMetadata, CacheError> {
            self.loads.set(self.loads.get() + 1);
            tokio::task::yield_now().await;
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(CacheError::Io {
                    identifier: identifier.to_string(),
                    message: "disk on fire".into(),
                });
            }
            self.inner.load(identifier).await
        }

        fn identifiers(&self) -> Result<Vec<String>, CacheError> {
            self.inner.identifiers()
        }
    }

    fn notes() -> MemoryNoteSource {
        MemoryNoteSource::new()
            .with_note("roadmap", "Roadmap")
            .with_note("inbox", "Inbox")
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_fetch() {
        let source = Rc::new(SlowSource::new(notes()));
        let cache = NoteCache::new(source.clone());

        let (a, b, c) = futures::join!(
            cache.ensure_loaded("roadmap"),
            cache.resolve_title("roadmap"),
            cache.ensure_loaded("roadmap"),
        );

        assert_eq!(a, Ok(()));
        assert_eq!(b, Ok("Roadmap".to_string()));
        assert_eq!(c, Ok(()));
        assert_eq!(source.loads.get(), 1);
        assert_eq!(cache.fetch_count(), 1);
    }

    #[tokio::test]
    async fn cached_entries_are_not_fetched_again() {
        let source = Rc::new(SlowSource::new(notes()));
        let cache = NoteCache::new(source.clone());

        assert_eq!(cache.get_from_cache_sync("inbox"), None);
        cache.ensure_loaded("inbox").await.unwrap();
        cache.ensure_loaded("inbox").await.unwrap();

        assert_eq!(source.loads.get(), 1);
        assert_eq!(
            cache.get_from_cache_sync("inbox").map(|m| m.title),
            Some("Inbox".to_string())
        );
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let source = Rc::new(SlowSource::new(notes()));
        source.failures_left.set(1);
        let cache = NoteCache::new(source.clone());

        assert!(matches!(
            cache.ensure_loaded("roadmap").await,
            Err(CacheError::Io { .. })
        ));
        assert_eq!(cache.get_from_cache_sync("roadmap"), None);

        cache.ensure_loaded("roadmap").await.unwrap();
        assert_eq!(source.loads.get(), 2);
    }

    #[tokio::test]
    async fn unknown_identifier_is_not_found() {
        let cache = NoteCache::new(Rc::new(notes()));
        assert_eq!(
            cache.resolve_title("ghost").await,
            Err(CacheError::NotFound("ghost".into()))
        );
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn preload_loads_every_note() {
        let cache = NoteCache::new(Rc::new(notes()));
        assert_eq!(cache.preload().await, Ok(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn insert_seeds_without_fetching() {
        let cache = NoteCache::new(Rc::new(notes()));
        cache.insert(NoteMetadata {
            identifier: "x".into(),
            title: "X".into(),
        });
        assert_eq!(cache.get_from_cache_sync("x").map(|m| m.title), Some("X".into()));
        assert_eq!(cache.fetch_count(), 0);
    }
}
