//! In-process [`DocumentStore`] with push-on-write watches.
//!
//! Useful for offline development and as a stand-in for the hosted store in
//! tests. [`MemoryDocumentStore::set_failing`] makes every call fail, and
//! [`MemoryDocumentStore::break_watches`] ends every live query with an
//! error.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::document::{
    check_collection_path, split_document_path, Document, Fields, Query, Watch,
};
use crate::error::{RemoteError, Result};
use crate::store::DocumentStore;

type Collection = BTreeMap<String, Fields>;

struct Watcher {
    query: Query,
    tx: mpsc::UnboundedSender<Result<Vec<Document>>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Collection>,
    watchers: Vec<Watcher>,
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: Mutex<Inner>,
    failing: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `Unavailable` (or stop doing so).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// End every registered watch with an error.
    pub fn break_watches(&self, reason: &str) {
        let Ok(mut inner) = self.lock() else {
            return;
        };
        for watcher in inner.watchers.drain(..) {
            let _ = watcher
                .tx
                .send(Err(RemoteError::Unavailable(reason.to_string())));
        }
    }

    /// Number of watches whose receiver is still alive.
    pub fn active_watches(&self) -> usize {
        match self.lock() {
            Ok(mut inner) => {
                inner.watchers.retain(|w| !w.tx.is_closed());
                inner.watchers.len()
            }
            Err(_) => 0,
        }
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("simulated outage".into()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| RemoteError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut inner = self.lock()?;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        notify(&mut inner, collection);
        Ok(())
    }
}

fn snapshot(inner: &Inner, query: &Query) -> Vec<Document> {
    let mut docs: Vec<Document> = inner
        .collections
        .get(&query.collection)
        .map(|c| {
            c.iter()
                .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                .collect()
        })
        .unwrap_or_default();
    query.arrange(&mut docs);
    docs
}

// Push the fresh result set to every watcher of `collection`, pruning
// watchers whose receiver was dropped.
fn notify(inner: &mut Inner, collection: &str) {
    let watchers = std::mem::take(&mut inner.watchers);
    let mut kept = Vec::with_capacity(watchers.len());
    for watcher in watchers {
        if watcher.query.collection == collection {
            let docs = snapshot(inner, &watcher.query);
            if watcher.tx.send(Ok(docs)).is_err() {
                continue;
            }
        }
        if !watcher.tx.is_closed() {
            kept.push(watcher);
        }
    }
    inner.watchers = kept;
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        self.check()?;
        let (collection, id) = split_document_path(path)?;
        let inner = self.lock()?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn set_document(&self, path: &str, fields: Fields) -> Result<()> {
        self.check()?;
        let (collection, id) = split_document_path(path)?;
        self.write(collection, id, fields)
    }

    async fn create_document(&self, collection: &str, id: &str, fields: Fields) -> Result<Document> {
        self.check()?;
        check_collection_path(collection)?;
        self.write(collection, id, fields.clone())?;
        Ok(Document::new(id, fields))
    }

    async fn update_document(&self, path: &str, fields: Fields) -> Result<()> {
        self.check()?;
        let (collection, id) = split_document_path(path)?;
        let mut inner = self.lock()?;
        let existing = inner
            .collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))?;
        existing.extend(fields);
        notify(&mut inner, collection);
        Ok(())
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Document>> {
        self.check()?;
        check_collection_path(&query.collection)?;
        let inner = self.lock()?;
        Ok(snapshot(&inner, query))
    }

    fn watch(&self, query: Query) -> Result<Watch> {
        self.check()?;
        check_collection_path(&query.collection)?;
        let (tx, rx) = mpsc::unbounded_channel();

        let mut inner = self.lock()?;
        let _ = tx.send(Ok(snapshot(&inner, &query)));
        inner.watchers.push(Watcher { query, tx });
        Ok(rx)
    }
}
