use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;

use crate::model::{GitBranch, GitTag};

/// What moved inside a repository, classified from the `.git` path the
/// filesystem reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryChangeKind {
    Config,
    Head,
    Heads,
    Index,
    Remotes,
    Stash,
    Tags,
    Unknown,
}

impl RepositoryChangeKind {
    /// Classify a path relative to the `.git` directory.
    pub fn from_git_path(relative: &Path) -> Self {
        let mut components = relative.components().filter_map(|c| c.as_os_str().to_str());
        match components.next() {
            Some("HEAD") | Some("ORIG_HEAD") | Some("MERGE_HEAD") => Self::Head,
            Some("config") => Self::Config,
            Some("index") => Self::Index,
            Some("refs") => match components.next() {
                Some("heads") => Self::Heads,
                Some("remotes") => Self::Remotes,
                Some("stash") => Self::Stash,
                Some("tags") => Self::Tags,
                _ => Self::Unknown,
            },
            _ => Self::Unknown,
        }
    }
}

/// A discovered repository root.
///
/// The path is canonical (symlinks resolved at discovery time). Change
/// events fan out over a broadcast channel; branch and tag listings
/// are cached lazily and dropped when a relevant event fires.
pub struct Repository {
    path: PathBuf,
    folder: PathBuf,
    closed: AtomicBool,
    suspended: AtomicBool,
    pending_while_suspended: AtomicBool,
    changes: broadcast::Sender<RepositoryChangeKind>,
    branches: Mutex<Option<Arc<Vec<GitBranch>>>>,
    tags: Mutex<Option<Arc<Vec<GitTag>>>>,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl Repository {
    pub fn new(path: PathBuf, folder: PathBuf) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            path,
            folder,
            closed: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
            pending_while_suspended: AtomicBool::new(false),
            changes,
            branches: Mutex::new(None),
            tags: Mutex::new(None),
            watcher: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RepositoryChangeKind> {
        self.changes.subscribe()
    }

    /// Route a change through the repository: invalidate the ref
    /// caches it touches and notify subscribers. While suspended,
    /// events are coalesced into a single `Unknown` fired on resume.
    pub fn fire_change(&self, kind: RepositoryChangeKind) {
        match kind {
            RepositoryChangeKind::Heads | RepositoryChangeKind::Head => {
                *self.branches.lock().unwrap() = None;
            }
            RepositoryChangeKind::Tags => {
                *self.tags.lock().unwrap() = None;
            }
            RepositoryChangeKind::Config => {
                *self.branches.lock().unwrap() = None;
                *self.tags.lock().unwrap() = None;
            }
            _ => {}
        }
        if self.is_suspended() {
            self.pending_while_suspended.store(true, Ordering::SeqCst);
            return;
        }
        let _ = self.changes.send(kind);
    }

    /// Pause event delivery (editor window lost focus).
    pub fn suspend(&self) {
        self.suspended.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.suspended.store(false, Ordering::SeqCst);
        if self.pending_while_suspended.swap(false, Ordering::SeqCst) {
            let _ = self.changes.send(RepositoryChangeKind::Unknown);
        }
    }

    /// Start watching the `.git` directory, classifying filesystem
    /// events into change kinds.
    pub fn watch(self: &Arc<Self>) -> Result<(), notify::Error> {
        let git_dir = self.path.join(".git");
        let repo = Arc::downgrade(self);
        let root = git_dir.clone();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                let Some(repo) = repo.upgrade() else { return };
                for path in &event.paths {
                    let kind = path
                        .strip_prefix(&root)
                        .map(RepositoryChangeKind::from_git_path)
                        .unwrap_or(RepositoryChangeKind::Unknown);
                    repo.fire_change(kind);
                }
            })?;
        watcher.watch(&git_dir, RecursiveMode::Recursive)?;
        *self.watcher.lock().unwrap() = Some(watcher);
        Ok(())
    }

    /// Tear down watchers and subscriptions; the repository will not
    /// fire again.
    pub fn dispose(&self) {
        self.closed.store(true, Ordering::SeqCst);
        *self.watcher.lock().unwrap() = None;
        *self.branches.lock().unwrap() = None;
        *self.tags.lock().unwrap() = None;
    }

    pub fn cached_branches(&self) -> Option<Arc<Vec<GitBranch>>> {
        self.branches.lock().unwrap().clone()
    }

    pub fn store_branches(&self, branches: Vec<GitBranch>) -> Arc<Vec<GitBranch>> {
        let arc = Arc::new(branches);
        *self.branches.lock().unwrap() = Some(arc.clone());
        arc
    }

    pub fn cached_tags(&self) -> Option<Arc<Vec<GitTag>>> {
        self.tags.lock().unwrap().clone()
    }

    pub fn store_tags(&self, tags: Vec<GitTag>) -> Arc<Vec<GitTag>> {
        let arc = Arc::new(tags);
        *self.tags.lock().unwrap() = Some(arc.clone());
        arc
    }
}
