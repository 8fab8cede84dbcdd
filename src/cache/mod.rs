//! Per-document cache of in-flight and resolved retrievals.
//!
//! Each open document (file + optional revision) owns a small map from
//! operation cache-key to a shared future. Two callers asking for the
//! same key before the first resolves receive the same future, so at
//! most one subprocess runs per (document, operation, parameters)
//! tuple. Failed retrievals are replaced by a resolved-empty sentinel
//! carrying the error text, so a known-bad key never re-spawns git.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::GitError;
use crate::model::{GitBlame, GitDiff, GitLog};

pub type CachedFuture<T> = Shared<BoxFuture<'static, Result<Option<Arc<T>>, GitError>>>;

/// A cached retrieval: the (possibly still pending) shared future and,
/// once a failure has been converted to an empty sentinel, the error
/// text for diagnostics.
pub struct CacheEntry<T> {
    pub value: CachedFuture<T>,
    pub error_message: Option<String>,
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            error_message: self.error_message.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> CacheEntry<T> {
    pub fn pending(value: CachedFuture<T>) -> Self {
        Self {
            value,
            error_message: None,
        }
    }

    /// A resolved-empty sentinel. Lookups short-circuit to `None`
    /// without re-invoking the subprocess layer.
    pub fn empty(error_message: Option<String>) -> Self {
        Self {
            value: futures::future::ready(Ok(None)).boxed().shared(),
            error_message,
        }
    }
}

/// Composite identity of a tracked document: normalized path plus
/// optional revision sha.
pub fn document_key(path: &Path, sha: Option<&str>) -> String {
    match sha {
        Some(sha) => format!("{}|{sha}", path.display()),
        None => path.display().to_string(),
    }
}

/// Typed access to the per-operation cache maps of a document.
pub trait Cached: Send + Sync + Sized + 'static {
    fn slot(state: &mut DocumentState) -> &mut HashMap<String, CacheEntry<Self>>;
}

#[derive(Default)]
pub struct DocumentState {
    refresh_on_next_change: bool,
    blame: HashMap<String, CacheEntry<GitBlame>>,
    diff: HashMap<String, CacheEntry<GitDiff>>,
    log: HashMap<String, CacheEntry<GitLog>>,
}

impl Cached for GitBlame {
    fn slot(state: &mut DocumentState) -> &mut HashMap<String, CacheEntry<Self>> {
        &mut state.blame
    }
}

impl Cached for GitDiff {
    fn slot(state: &mut DocumentState) -> &mut HashMap<String, CacheEntry<Self>> {
        &mut state.diff
    }
}

impl Cached for GitLog {
    fn slot(state: &mut DocumentState) -> &mut HashMap<String, CacheEntry<Self>> {
        &mut state.log
    }
}

/// One tracked document and its cached results.
pub struct TrackedDocument {
    key: String,
    path: String,
    state: Mutex<DocumentState>,
}

impl TrackedDocument {
    fn new(key: String, path: String) -> Self {
        Self {
            key,
            path,
            state: Mutex::new(DocumentState::default()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get<T: Cached>(&self, cache_key: &str) -> Option<CacheEntry<T>> {
        let mut state = self.state.lock().unwrap();
        T::slot(&mut state).get(cache_key).cloned()
    }

    /// Atomic lookup-or-insert under one lock: concurrent callers that
    /// miss simultaneously still converge on a single entry (and thus
    /// a single subprocess).
    pub fn get_or_set<T: Cached>(
        &self,
        cache_key: &str,
        make: impl FnOnce() -> CacheEntry<T>,
    ) -> CacheEntry<T> {
        let mut state = self.state.lock().unwrap();
        T::slot(&mut state)
            .entry(cache_key.to_string())
            .or_insert_with(make)
            .clone()
    }

    /// Idempotent overwrite.
    pub fn set<T: Cached>(&self, cache_key: &str, entry: CacheEntry<T>) {
        let mut state = self.state.lock().unwrap();
        T::slot(&mut state).insert(cache_key.to_string(), entry);
    }

    /// Replace whatever is stored under `cache_key` with an empty
    /// sentinel recording the failure.
    pub fn set_empty<T: Cached>(&self, cache_key: &str, error_message: String) {
        self.set(cache_key, CacheEntry::<T>::empty(Some(error_message)));
    }

    /// Drop all cached results.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.blame.clear();
        state.diff.clear();
        state.log.clear();
        state.refresh_on_next_change = false;
    }

    /// The document acquired unsaved edits. Results computed against
    /// the pre-edit content must not survive the next change
    /// notification; arm a one-shot flag.
    pub fn mark_dirty(&self) {
        let mut state = self.state.lock().unwrap();
        state.refresh_on_next_change = true;
    }

    /// A content-change notification arrived. Returns true when the
    /// armed flag forced a reset.
    pub fn content_changed(&self) -> bool {
        let armed = {
            let mut state = self.state.lock().unwrap();
            std::mem::take(&mut state.refresh_on_next_change)
        };
        if armed {
            self.reset();
        }
        armed
    }

    /// The document was saved; everything cached is stale.
    pub fn saved(&self) {
        self.reset();
    }
}

/// Registry of tracked documents, keyed by [`document_key`].
#[derive(Default)]
pub struct DocumentTracker {
    docs: Mutex<HashMap<String, Arc<TrackedDocument>>>,
}

impl DocumentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_add(&self, path: &Path, sha: Option<&str>) -> Arc<TrackedDocument> {
        let key = document_key(path, sha);
        let mut docs = self.docs.lock().unwrap();
        docs.entry(key.clone())
            .or_insert_with(|| {
                Arc::new(TrackedDocument::new(key, path.display().to_string()))
            })
            .clone()
    }

    pub fn get(&self, path: &Path, sha: Option<&str>) -> Option<Arc<TrackedDocument>> {
        let key = document_key(path, sha);
        self.docs.lock().unwrap().get(&key).cloned()
    }

    /// Reset every document whose path lies under `root`. Used when a
    /// repository reports a relevant change event.
    pub fn reset_under(&self, root: &Path) {
        let root = root.display().to_string();
        let docs = self.docs.lock().unwrap();
        for doc in docs.values() {
            if doc.path.starts_with(&root) {
                doc.reset();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.lock().unwrap().is_empty()
    }
}
