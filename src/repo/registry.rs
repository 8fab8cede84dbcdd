use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::repo::repository::Repository;

/// Path-indexed registry of discovered repositories.
///
/// Lookups normalize through `realpath` so symlinked checkouts resolve
/// to one canonical entry. The map is mutated only by the registry
/// itself; readers take snapshots.
#[derive(Default)]
pub struct RepositoryRegistry {
    repos: Mutex<BTreeMap<PathBuf, Arc<Repository>>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, repo: Arc<Repository>) {
        self.repos
            .lock()
            .unwrap()
            .insert(repo.path().to_path_buf(), repo);
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Repository>> {
        self.repos.lock().unwrap().get(path).cloned()
    }

    /// Longest-prefix match: the nearest registered ancestor of `path`
    /// (or `path` itself).
    pub fn find_nearest(&self, path: &Path) -> Option<Arc<Repository>> {
        let repos = self.repos.lock().unwrap();
        path.ancestors().find_map(|candidate| repos.get(candidate).cloned())
    }

    /// The sole registered repository, used as the default context when
    /// no file is in scope.
    pub fn highlander(&self) -> Option<Arc<Repository>> {
        let repos = self.repos.lock().unwrap();
        if repos.len() == 1 {
            repos.values().next().cloned()
        } else {
            None
        }
    }

    pub fn all(&self) -> Vec<Arc<Repository>> {
        self.repos.lock().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.repos.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.lock().unwrap().is_empty()
    }

    /// Dispose and drop every repository nested under `prefix`
    /// (workspace folder removal).
    pub fn remove_under(&self, prefix: &Path) -> usize {
        let mut repos = self.repos.lock().unwrap();
        let doomed: Vec<PathBuf> = repos
            .keys()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect();
        for path in &doomed {
            if let Some(repo) = repos.remove(path) {
                repo.dispose();
            }
        }
        doomed.len()
    }

    /// Discover repositories under a workspace folder and register
    /// them. Returns the repositories found (already inserted).
    pub async fn register_folder(
        &self,
        folder: &Path,
        depth: usize,
        exclude_globs: &[String],
    ) -> Vec<Arc<Repository>> {
        let folder = tokio::fs::canonicalize(folder)
            .await
            .unwrap_or_else(|_| folder.to_path_buf());
        let excludes = build_exclude_set(exclude_globs);
        let roots = discover(folder.clone(), depth, Arc::new(excludes)).await;

        let mut found = Vec::new();
        for root in roots {
            let repo = Arc::new(Repository::new(root, folder.clone()));
            self.insert(repo.clone());
            found.push(repo);
        }
        found
    }

    /// Resolve the repository owning `path`, discovering lazily: when
    /// no registered ancestor matches, walk the filesystem upward
    /// looking for a `.git` entry and register what is found. `None`
    /// means the path is not inside any repository.
    pub async fn resolve(&self, path: &Path) -> Option<Arc<Repository>> {
        let canonical = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());
        if let Some(repo) = self.find_nearest(&canonical) {
            return Some(repo);
        }
        let start = if canonical.is_dir() {
            canonical.clone()
        } else {
            canonical.parent()?.to_path_buf()
        };
        for candidate in start.ancestors() {
            if has_git_entry(candidate).await {
                let repo = Arc::new(Repository::new(
                    candidate.to_path_buf(),
                    candidate.to_path_buf(),
                ));
                self.insert(repo.clone());
                return Some(repo);
            }
        }
        None
    }
}

/// A `.git` directory, or a `.git` file for worktrees/submodules.
async fn has_git_entry(dir: &Path) -> bool {
    tokio::fs::metadata(dir.join(".git")).await.is_ok()
}

pub fn build_exclude_set(globs: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in globs {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!("ignoring invalid exclude glob {pattern}: {e}"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Walk `dir` down to `depth` levels, collecting repository roots.
/// Excluded directories are never descended into; unreadable
/// directories are logged and skipped without aborting the scan.
fn discover(dir: PathBuf, depth: usize, excludes: Arc<GlobSet>) -> BoxFuture<'static, Vec<PathBuf>> {
    async move {
        let mut found = Vec::new();

        if has_git_entry(&dir).await {
            found.push(dir.clone());
            return found;
        }
        if depth == 0 {
            return found;
        }

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("skipping unreadable directory {}: {e}", dir.display());
                return found;
            }
        };

        let mut subdirs = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    let is_dir = entry
                        .file_type()
                        .await
                        .map(|t| t.is_dir())
                        .unwrap_or(false);
                    if !is_dir {
                        continue;
                    }
                    if path.file_name().is_some_and(|n| n == ".git") {
                        continue;
                    }
                    if excludes.is_match(&path) {
                        continue;
                    }
                    subdirs.push(path);
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("error listing {}: {e}", dir.display());
                    break;
                }
            }
        }

        for subdir in subdirs {
            found.extend(discover(subdir, depth - 1, excludes.clone()).await);
        }
        found
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_at(path: &str) -> Arc<Repository> {
        Arc::new(Repository::new(PathBuf::from(path), PathBuf::from("/ws")))
    }

    #[test]
    fn find_nearest_prefers_longest_prefix() {
        let registry = RepositoryRegistry::new();
        registry.insert(repo_at("/ws/outer"));
        registry.insert(repo_at("/ws/outer/sub/inner"));

        let hit = registry
            .find_nearest(Path::new("/ws/outer/sub/inner/src/lib.rs"))
            .unwrap();
        assert_eq!(hit.path(), Path::new("/ws/outer/sub/inner"));

        let hit = registry
            .find_nearest(Path::new("/ws/outer/other/file.rs"))
            .unwrap();
        assert_eq!(hit.path(), Path::new("/ws/outer"));

        assert!(registry.find_nearest(Path::new("/elsewhere/x")).is_none());
    }

    #[test]
    fn highlander_only_when_exactly_one() {
        let registry = RepositoryRegistry::new();
        assert!(registry.highlander().is_none());
        registry.insert(repo_at("/ws/one"));
        assert!(registry.highlander().is_some());
        registry.insert(repo_at("/ws/two"));
        assert!(registry.highlander().is_none());
    }

    #[test]
    fn remove_under_disposes_nested_repositories() {
        let registry = RepositoryRegistry::new();
        let inner = repo_at("/ws/folder/app");
        registry.insert(repo_at("/ws/folder"));
        registry.insert(inner.clone());
        registry.insert(repo_at("/ws/other"));

        let removed = registry.remove_under(Path::new("/ws/folder"));
        assert_eq!(removed, 2);
        assert_eq!(registry.len(), 1);
        assert!(inner.is_closed());
    }

    #[tokio::test]
    async fn discovery_finds_nested_repos_and_honors_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("app/.git")).unwrap();
        std::fs::create_dir_all(root.join("lib/.git")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/dep/.git")).unwrap();
        std::fs::create_dir_all(root.join("plain")).unwrap();

        let excludes = build_exclude_set(&["**/node_modules".to_string()]);
        let mut roots = discover(root.to_path_buf(), 2, Arc::new(excludes)).await;
        roots.sort();

        let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let names: Vec<String> = roots
            .iter()
            .filter_map(|p| p.strip_prefix(&canonical).ok().or(p.strip_prefix(root).ok()))
            .map(|p| p.display().to_string())
            .collect();
        assert_eq!(names, vec!["app", "lib"]);
    }

    #[tokio::test]
    async fn discovery_stops_at_depth() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("a/b/c/.git")).unwrap();

        let excludes = Arc::new(GlobSet::empty());
        assert!(discover(root.to_path_buf(), 2, excludes.clone()).await.is_empty());
        assert_eq!(discover(root.to_path_buf(), 3, excludes).await.len(), 1);
    }
}
