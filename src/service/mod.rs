//! The retrieval façade: computes cache keys, shells out through the
//! runner, hands output to the parsers, and memoizes per tracked
//! document.

pub mod search;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;

use crate::cache::{CacheEntry, Cached, DocumentTracker};
use crate::config::LoupeConfig;
use crate::document::{DocumentProvider, NoDocuments};
use crate::error::git_error::PatchApplyConflictSnafu;
use crate::error::GitError;
use crate::model::{
    sort_branches, sort_tags, GitBlame, GitBlameLine, GitBranch, GitCommit, GitContributor,
    GitDiff, GitDiffShortStat, GitLog, GitReflog, GitStash, GitStatus, GitStatusFile, GitTag,
    GitTreeEntry, LogQuery, LogRange, MoreBy,
};
use crate::parse;
use crate::process::GitRunner;
use crate::repo::{Repository, RepositoryChangeKind, RepositoryRegistry};
use crate::revision;
use crate::version::STATUS_PORCELAIN_V2;
use search::{parse_search_operations, SearchOperator, SearchQuery};

/// Options for repository-scoped history queries.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub reference: Option<String>,
    /// Page size; `None` uses the configured default, `Some(0)` is
    /// unlimited.
    pub limit: Option<usize>,
    pub authors: Vec<String>,
    pub merges_only: bool,
    pub reverse: bool,
}

/// Options for file-scoped history queries.
#[derive(Debug, Clone, Default)]
pub struct FileLogOptions {
    pub reference: Option<String>,
    pub limit: Option<usize>,
    /// Restrict to a line range (`-L`); disables file-status listing.
    pub range: Option<LogRange>,
    /// Follow renames; `None` uses the configured default.
    pub renames: Option<bool>,
    pub reverse: bool,
}

pub struct GitService {
    runner: Arc<GitRunner>,
    tracker: Arc<DocumentTracker>,
    registry: Arc<RepositoryRegistry>,
    documents: Arc<dyn DocumentProvider>,
    config: LoupeConfig,
}

impl GitService {
    pub fn new(config: LoupeConfig) -> Self {
        Self {
            runner: Arc::new(GitRunner::new()),
            tracker: Arc::new(DocumentTracker::new()),
            registry: Arc::new(RepositoryRegistry::new()),
            documents: Arc::new(NoDocuments),
            config,
        }
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentProvider>) -> Self {
        self.documents = documents;
        self
    }

    /// Substitute the subprocess runner (e.g. a custom git path).
    pub fn with_runner(mut self, runner: Arc<GitRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &LoupeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RepositoryRegistry> {
        &self.registry
    }

    pub fn tracker(&self) -> &Arc<DocumentTracker> {
        &self.tracker
    }

    pub fn runner(&self) -> &Arc<GitRunner> {
        &self.runner
    }

    /// Resolve the repository owning `file`, or `None` when the path is
    /// not under version control anywhere.
    pub async fn repository_for(&self, file: &Path) -> Option<Arc<Repository>> {
        self.registry.resolve(file).await
    }

    // ------------------------------------------------------------------
    // blame

    pub async fn blame_for_file(
        &self,
        file: &Path,
        rev: Option<&str>,
    ) -> Result<Option<Arc<GitBlame>>, GitError> {
        if rev.is_some_and(revision::is_deleted_or_missing) {
            return Ok(None);
        }
        let Some((_, canonical, rel, repo_path)) = self.locate(file).await else {
            return Ok(None);
        };

        let cache_key = match rev {
            Some(rev) => format!("blame:{rev}"),
            None => "blame".to_string(),
        };
        let args = self.blame_args(&rel, rev, None);
        let runner = self.runner.clone();
        let fetch = async move {
            match run_owned(runner, &repo_path, args, None).await {
                Ok(raw) => Ok(parse::blame::parse_blame(&repo_path, &raw)),
                Err(e) if expected_none(&e) => Ok(None),
                Err(e) => Err(e),
            }
        };
        self.cached(&canonical, rev, cache_key, fetch).await
    }

    /// Blame against supplied buffer contents (`--contents -`), for
    /// documents with unsaved edits. Never cached: the content is
    /// not addressable.
    pub async fn blame_for_contents(
        &self,
        file: &Path,
        contents: &str,
    ) -> Result<Option<GitBlame>, GitError> {
        let Some((_, _, rel, repo_path)) = self.locate(file).await else {
            return Ok(None);
        };
        let args = self.blame_args(&rel, None, Some("-"));
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        match self
            .runner
            .run_with_stdin(&repo_path, &arg_refs, contents)
            .await
        {
            Ok(raw) => Ok(parse::blame::parse_blame(&repo_path, &raw)),
            Err(e) if expected_none(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Blame the document as the editor sees it: dirty buffers are
    /// blamed through their current text, clean ones through HEAD.
    pub async fn blame_for_document(
        &self,
        file: &Path,
    ) -> Result<Option<Arc<GitBlame>>, GitError> {
        if self.documents.is_dirty(file) {
            if let Some(contents) = self.documents.contents(file) {
                return Ok(self
                    .blame_for_contents(file, &contents)
                    .await?
                    .map(Arc::new));
            }
        }
        self.blame_for_file(file, None).await
    }

    pub async fn blame_for_line(
        &self,
        file: &Path,
        line: u32,
        rev: Option<&str>,
    ) -> Result<Option<(GitBlameLine, GitCommit)>, GitError> {
        let Some(blame) = self.blame_for_file(file, rev).await? else {
            return Ok(None);
        };
        Ok(blame
            .for_line(line)
            .map(|(record, commit)| (record.clone(), commit.clone())))
    }

    fn blame_args(&self, rel: &Path, rev: Option<&str>, contents: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "blame".to_string(),
            "--root".to_string(),
            "--porcelain".to_string(),
        ];
        if self.config.blame_ignore_whitespace {
            args.push("-w".to_string());
        }
        args.extend(self.config.blame_custom_arguments.iter().cloned());
        if let Some(contents) = contents {
            args.push("--contents".to_string());
            args.push(contents.to_string());
        }
        if let Some(rev) = rev {
            if !revision::is_uncommitted(rev) {
                args.push(rev.to_string());
            }
        }
        args.push("--".to_string());
        args.push(rel.display().to_string());
        args
    }

    // ------------------------------------------------------------------
    // diff

    pub async fn diff_for_file(
        &self,
        file: &Path,
        ref1: Option<&str>,
        ref2: Option<&str>,
    ) -> Result<Option<Arc<GitDiff>>, GitError> {
        if ref1.is_some_and(revision::is_deleted_or_missing)
            || ref2.is_some_and(revision::is_deleted_or_missing)
        {
            return Ok(None);
        }
        let Some((_, canonical, rel, repo_path)) = self.locate(file).await else {
            return Ok(None);
        };

        let cache_key = format!("diff:{}:{}", ref1.unwrap_or(""), ref2.unwrap_or(""));
        let mut args = vec![
            "diff".to_string(),
            "-U0".to_string(),
            format!("-M{}%", self.config.similarity_threshold),
        ];
        for reference in [ref1, ref2].into_iter().flatten() {
            if revision::is_uncommitted_staged(reference) {
                args.push("--staged".to_string());
            } else if !revision::is_uncommitted(reference) {
                args.push(reference.to_string());
            }
        }
        args.push("--".to_string());
        args.push(rel.display().to_string());

        let runner = self.runner.clone();
        let fetch = async move {
            match run_owned(runner, &repo_path, args, None).await {
                Ok(raw) => Ok(parse::diff::parse_diff(&raw)),
                Err(e) if expected_none(&e) => Ok(None),
                Err(e) => Err(e),
            }
        };
        self.cached(&canonical, ref1, cache_key, fetch).await
    }

    /// Diff a revision against the one before it. The deleted-or-
    /// missing sentinel short-circuits: there is nothing to look up.
    pub async fn diff_with_previous(
        &self,
        file: &Path,
        rev: Option<&str>,
    ) -> Result<Option<Arc<GitDiff>>, GitError> {
        match rev {
            None => self.diff_for_file(file, Some("HEAD"), None).await,
            Some(rev) if revision::is_deleted_or_missing(rev) => Ok(None),
            Some(rev) if revision::is_uncommitted(rev) => {
                self.diff_for_file(file, Some("HEAD"), Some(rev)).await
            }
            Some(rev) => {
                let previous = format!("{rev}^");
                self.diff_for_file(file, Some(&previous), Some(rev)).await
            }
        }
    }

    /// `--shortstat` summary between two revisions (or the working
    /// tree).
    pub async fn diff_shortstat(
        &self,
        repo_path: &Path,
        ref1: Option<&str>,
        ref2: Option<&str>,
    ) -> Result<Option<GitDiffShortStat>, GitError> {
        let mut args = vec!["diff".to_string(), "--shortstat".to_string()];
        for reference in [ref1, ref2].into_iter().flatten() {
            args.push(reference.to_string());
        }
        match run_owned(self.runner.clone(), repo_path, args, None).await {
            Ok(raw) => Ok(parse::diff::parse_shortstat(&raw)),
            Err(e) if expected_none(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // status

    pub async fn status_for_repo(&self, repo_path: &Path) -> Result<Option<GitStatus>, GitError> {
        // Porcelain v2 needs git 2.11; when the version probe failed
        // the version is unknown and v1 is assumed.
        let v2 = self
            .runner
            .version()
            .await
            .is_some_and(|v| v >= STATUS_PORCELAIN_V2);
        let args: &[&str] = if v2 {
            &["status", "--porcelain=v2", "--branch"]
        } else {
            &["status", "--porcelain", "--branch"]
        };
        match self.runner.run(repo_path, args).await {
            Ok(raw) if v2 => Ok(parse::status::parse_status_v2(repo_path, &raw)),
            Ok(raw) => Ok(parse::status::parse_status_v1(repo_path, &raw)),
            Err(e) if expected_none(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn status_for_file(
        &self,
        file: &Path,
    ) -> Result<Option<GitStatusFile>, GitError> {
        let Some((_, _, rel, repo_path)) = self.locate(file).await else {
            return Ok(None);
        };
        let Some(status) = self.status_for_repo(&repo_path).await? else {
            return Ok(None);
        };
        Ok(status.file(&rel).cloned())
    }

    // ------------------------------------------------------------------
    // log

    pub async fn log(
        &self,
        repo_path: &Path,
        options: &LogOptions,
    ) -> Result<Option<GitLog>, GitError> {
        let query = LogQuery {
            reference: options.reference.clone(),
            file: None,
            authors: options.authors.clone(),
            merges: options.merges_only,
            reverse: options.reverse,
            renames: false,
            range: None,
        };
        let limit = page_limit(options.limit, self.config.max_list_items);
        fetch_log(
            self.runner.clone(),
            repo_path.to_path_buf(),
            query,
            None,
            limit,
            self.config.similarity_threshold,
        )
        .await
    }

    pub async fn log_for_file(
        &self,
        file: &Path,
        options: &FileLogOptions,
    ) -> Result<Option<Arc<GitLog>>, GitError> {
        if options
            .reference
            .as_deref()
            .is_some_and(revision::is_deleted_or_missing)
        {
            return Ok(None);
        }
        let Some((_, canonical, rel, repo_path)) = self.locate(file).await else {
            return Ok(None);
        };

        let renames = options
            .renames
            .unwrap_or(self.config.file_history_follows_renames);
        let limit = page_limit(options.limit, self.config.max_list_items);
        let query = LogQuery {
            reference: options.reference.clone(),
            file: Some(rel),
            authors: Vec::new(),
            merges: false,
            reverse: options.reverse,
            renames,
            range: options.range,
        };

        let cache_key = format!(
            "log:{}|{}|{}|{}|{}",
            options.reference.as_deref().unwrap_or(""),
            limit.map(|l| l.to_string()).unwrap_or_default(),
            renames,
            options.reverse,
            options
                .range
                .map(|r| format!("{},{}", r.start, r.end))
                .unwrap_or_default(),
        );

        let runner = self.runner.clone();
        let similarity = self.config.similarity_threshold;
        let fetch =
            async move { fetch_log(runner, repo_path, query, None, limit, similarity).await };
        self.cached(&canonical, options.reference.as_deref(), cache_key, fetch)
            .await
    }

    /// Extend a log snapshot with older history.
    ///
    /// `MoreBy::Limit(n)` fetches the next `n` commits past the
    /// cursor; `MoreBy::Until(sha)` fetches everything between that
    /// sha and the cursor in one shot (a no-op when the sha is
    /// already present). Calling this after `has_more` turned false
    /// returns the log unchanged, so racing callers each converge on
    /// a self-consistent merged value.
    pub async fn log_more(&self, log: &GitLog, more: MoreBy) -> Result<GitLog, GitError> {
        if !log.has_more {
            return Ok(log.clone());
        }
        let Some(cursor) = log.cursor.clone() else {
            return Ok(log.clone());
        };

        let (reference, limit) = match &more {
            MoreBy::Limit(n) => (format!("{}^", cursor.oldest_sha), Some(*n)),
            MoreBy::Until(sha) => {
                if log.contains(sha) {
                    return Ok(log.clone());
                }
                (format!("{sha}^..{}^", cursor.oldest_sha), None)
            }
        };

        let older = fetch_log(
            self.runner.clone(),
            log.repo_path.clone(),
            log.query.clone(),
            Some(reference),
            limit,
            self.config.similarity_threshold,
        )
        .await?;

        let mut merged = match older {
            Some(older) => log.merged_with_older(&older),
            None => {
                let mut exhausted = log.clone();
                exhausted.has_more = false;
                return Ok(exhausted);
            }
        };
        if matches!(more, MoreBy::Until(_)) {
            // an until-fetch says nothing about history past the
            // target unless a root commit was reached
            let reached_root = merged
                .commits_in_order()
                .any(|c| c.parent_shas.is_empty());
            merged.has_more = !reached_root;
        }
        Ok(merged)
    }

    // ------------------------------------------------------------------
    // search

    /// Search history with typed operators. A query that is exactly one
    /// `commit:` operation holding a full sha skips the history grep
    /// and looks the commit up directly.
    pub async fn log_for_search(
        &self,
        repo_path: &Path,
        search: &SearchQuery,
    ) -> Result<Option<GitLog>, GitError> {
        let operations = parse_search_operations(&search.query);
        if operations.is_empty() {
            return Ok(None);
        }

        if let Some(commits) = operations.get(&SearchOperator::Commit) {
            if operations.len() == 1 && commits.len() == 1 && revision::is_sha(&commits[0]) {
                let sha = commits[0].clone();
                let args = vec![
                    "log".to_string(),
                    format!("--format={}", parse::log::LOG_FORMAT),
                    "-n".to_string(),
                    "1".to_string(),
                    sha.clone(),
                ];
                let query = LogQuery::for_ref(Some(sha));
                return match run_owned(self.runner.clone(), repo_path, args, None).await {
                    Ok(raw) => Ok(parse::log::parse_log(repo_path, &raw, query, None)),
                    Err(e) if expected_none(&e) || e.is_bad_revision() => Ok(None),
                    Err(e) => Err(e),
                };
            }
        }

        let limit = self.config.max_search_items;
        let mut args = vec![
            "log".to_string(),
            format!("--format={}", parse::log::LOG_FORMAT),
            "-n".to_string(),
            (limit + 1).to_string(),
            "--extended-regexp".to_string(),
        ];
        if !search.match_case {
            args.push("--regexp-ignore-case".to_string());
        }
        if search.match_all {
            args.push("--all-match".to_string());
        }
        for message in operations.get(&SearchOperator::Message).into_iter().flatten() {
            args.push(format!("--grep={message}"));
        }
        for author in operations.get(&SearchOperator::Author).into_iter().flatten() {
            args.push(format!("--author={author}"));
        }
        for change in operations.get(&SearchOperator::Change).into_iter().flatten() {
            args.push(format!("-G{change}"));
        }
        for commit in operations.get(&SearchOperator::Commit).into_iter().flatten() {
            args.push(commit.clone());
        }
        if let Some(files) = operations.get(&SearchOperator::File) {
            args.push("--".to_string());
            args.extend(files.iter().cloned());
        }

        let query = LogQuery::for_ref(None);
        match run_owned(self.runner.clone(), repo_path, args, None).await {
            Ok(raw) => Ok(parse::log::parse_log(repo_path, &raw, query, Some(limit))),
            Err(e) if expected_none(&e) || e.is_bad_revision() => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // refs and friends

    /// Branch listing, lazily cached on the repository and invalidated
    /// by its change events.
    pub async fn branches(&self, repo: &Repository) -> Result<Arc<Vec<GitBranch>>, GitError> {
        if let Some(cached) = repo.cached_branches() {
            return Ok(cached);
        }
        let format = format!("--format={}", parse::branch::BRANCH_FORMAT);
        let raw = self
            .runner
            .run(
                repo.path(),
                &["for-each-ref", format.as_str(), "refs/heads", "refs/remotes"],
            )
            .await?;
        let mut branches =
            parse::branch::parse_branches(repo.path(), &raw).unwrap_or_default();
        sort_branches(&mut branches, self.config.branch_sort);
        Ok(repo.store_branches(branches))
    }

    pub async fn tags(&self, repo: &Repository) -> Result<Arc<Vec<GitTag>>, GitError> {
        if let Some(cached) = repo.cached_tags() {
            return Ok(cached);
        }
        let format = format!("--format={}", parse::tag::TAG_FORMAT);
        let raw = self
            .runner
            .run(repo.path(), &["for-each-ref", format.as_str(), "refs/tags"])
            .await?;
        let mut tags = parse::tag::parse_tags(repo.path(), &raw).unwrap_or_default();
        sort_tags(&mut tags, self.config.tag_sort);
        Ok(repo.store_tags(tags))
    }

    pub async fn stash_list(&self, repo_path: &Path) -> Result<Option<Vec<GitStash>>, GitError> {
        let format = format!("--format={}", parse::stash::STASH_FORMAT);
        match self
            .runner
            .run(repo_path, &["stash", "list", format.as_str()])
            .await
        {
            Ok(raw) => Ok(parse::stash::parse_stash_list(repo_path, &raw)),
            Err(e) if expected_none(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn contributors(
        &self,
        repo_path: &Path,
        reference: Option<&str>,
    ) -> Result<Option<Vec<GitContributor>>, GitError> {
        let reference = reference.unwrap_or("HEAD");
        match self
            .runner
            .run(repo_path, &["shortlog", "-s", "-e", "-n", reference])
            .await
        {
            Ok(raw) => Ok(parse::shortlog::parse_shortlog(&raw)),
            Err(e) if expected_none(&e) || e.is_bad_revision() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn reflog(
        &self,
        repo_path: &Path,
        limit: Option<usize>,
    ) -> Result<Option<GitReflog>, GitError> {
        let limit = page_limit(limit, self.config.max_list_items);
        let format = format!("--format={}", parse::reflog::REFLOG_FORMAT);
        let mut args = vec!["log", "-g", format.as_str()];
        let n;
        if let Some(limit) = limit {
            n = (limit + 1).to_string();
            args.push("-n");
            args.push(n.as_str());
        }
        match self.runner.run(repo_path, &args).await {
            Ok(raw) => Ok(parse::reflog::parse_reflog(repo_path, &raw, limit)),
            Err(e) if expected_none(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn tree(
        &self,
        repo_path: &Path,
        reference: &str,
        path: Option<&Path>,
    ) -> Result<Option<Vec<GitTreeEntry>>, GitError> {
        if revision::is_sentinel(reference) {
            return Ok(None);
        }
        let mut args = vec!["ls-tree".to_string(), "-l".to_string(), reference.to_string()];
        if let Some(path) = path {
            args.push(path.display().to_string());
        }
        match run_owned(self.runner.clone(), repo_path, args, None).await {
            Ok(raw) => Ok(parse::tree::parse_tree(&raw)),
            Err(e) if expected_none(&e) || e.is_bad_revision() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// File content at a revision, as raw bytes. Sentinels resolve to
    /// `None` immediately: the working tree and index are read by the
    /// host, and deleted files have no content to show.
    pub async fn content_for_file(
        &self,
        file: &Path,
        reference: &str,
    ) -> Result<Option<Vec<u8>>, GitError> {
        if revision::is_sentinel(reference) {
            return Ok(None);
        }
        let Some((_, _, rel, repo_path)) = self.locate(file).await else {
            return Ok(None);
        };
        let spec = format!("{reference}:{}", rel.display());
        match self
            .runner
            .run_bytes(&repo_path, &["show", spec.as_str()], None)
            .await
        {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if expected_none(&e) || e.is_bad_revision() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve a refspec to a full sha; `None` for unknown revisions.
    pub async fn resolve_reference(
        &self,
        repo_path: &Path,
        refspec: &str,
    ) -> Result<Option<String>, GitError> {
        if revision::is_sentinel(refspec) {
            return Ok(None);
        }
        match self
            .runner
            .run(repo_path, &["rev-parse", "--verify", refspec])
            .await
        {
            Ok(raw) => Ok(Some(raw.trim().to_string())),
            Err(e) if expected_none(&e) || e.is_bad_revision() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn is_tracked(&self, file: &Path) -> Result<bool, GitError> {
        let Some((_, _, rel, repo_path)) = self.locate(file).await else {
            return Ok(false);
        };
        let rel = rel.display().to_string();
        match self
            .runner
            .run(&repo_path, &["ls-files", "--", rel.as_str()])
            .await
        {
            Ok(raw) => Ok(!raw.trim().is_empty()),
            Err(e) if expected_none(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Apply a unified patch to the working tree. On a conflict the
    /// error is [`GitError::PatchApplyConflict`]; callers may retry
    /// with `three_way` set to attempt a conflict-marked merge.
    pub async fn apply_patch(
        &self,
        repo_path: &Path,
        patch: &str,
        three_way: bool,
    ) -> Result<(), GitError> {
        let mut args = vec!["apply", "--whitespace=warn"];
        if three_way {
            args.push("--3way");
        }
        match self.runner.run_with_stdin(repo_path, &args, patch).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_patch_conflict() => {
                let stderr = match &e {
                    GitError::ExecutionFailed { stderr, .. } => stderr.clone(),
                    _ => e.to_string(),
                };
                PatchApplyConflictSnafu { stderr }.fail()
            }
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // invalidation plumbing

    /// A repository reported a change. Stash-only changes are
    /// explicitly excluded from document invalidation.
    pub fn handle_repository_change(&self, repo_path: &Path, kind: RepositoryChangeKind) {
        if kind == RepositoryChangeKind::Stash {
            return;
        }
        tracing::debug!(repo = %repo_path.display(), ?kind, "resetting document caches");
        self.tracker.reset_under(repo_path);
    }

    /// Forward a repository's change events into cache invalidation
    /// for as long as both sides live.
    pub fn watch_repository(self: &Arc<Self>, repo: &Arc<Repository>) {
        let service = Arc::downgrade(self);
        let mut events = repo.subscribe();
        let repo_path = repo.path().to_path_buf();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(kind) => {
                        let Some(service) = service.upgrade() else { break };
                        service.handle_repository_change(&repo_path, kind);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        });
    }

    /// The editor reports a document acquired unsaved edits.
    pub fn document_dirty(&self, file: &Path) {
        if let Some(doc) = self.tracker.get(file, None) {
            doc.mark_dirty();
        }
    }

    /// The editor reports a document content change.
    pub fn document_changed(&self, file: &Path) {
        if let Some(doc) = self.tracker.get(file, None) {
            doc.content_changed();
        }
    }

    /// The editor reports a document was saved.
    pub fn document_saved(&self, file: &Path) {
        if let Some(doc) = self.tracker.get(file, None) {
            doc.saved();
        }
    }

    // ------------------------------------------------------------------
    // internals

    /// Canonicalize `file`, resolve its repository, and compute the
    /// repo-relative path. `None` means not a repository.
    async fn locate(&self, file: &Path) -> Option<(Arc<Repository>, PathBuf, PathBuf, PathBuf)> {
        let canonical = tokio::fs::canonicalize(file)
            .await
            .unwrap_or_else(|_| file.to_path_buf());
        let repo = self.registry.resolve(&canonical).await?;
        let repo_path = repo.path().to_path_buf();
        let rel = canonical
            .strip_prefix(&repo_path)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| canonical.clone());
        Some((repo, canonical, rel, repo_path))
    }

    /// Memoize `fetch` under (document, cache-key). Concurrent callers
    /// for the same key share one future and one subprocess; failures
    /// are converted to cached empty sentinels carrying the error text.
    async fn cached<T, F>(
        &self,
        path: &Path,
        sha: Option<&str>,
        cache_key: String,
        fetch: F,
    ) -> Result<Option<Arc<T>>, GitError>
    where
        T: Cached,
        F: std::future::Future<Output = Result<Option<T>, GitError>> + Send + 'static,
    {
        if !self.config.caching_enabled {
            return Ok(fetch.await?.map(Arc::new));
        }
        let doc = self.tracker.get_or_add(path, sha);
        let doc_on_error = doc.clone();
        let key_on_error = cache_key.clone();
        let entry = doc.get_or_set(&cache_key, move || {
            let value = async move {
                match fetch.await {
                    Ok(value) => Ok(value.map(Arc::new)),
                    Err(e) => {
                        doc_on_error.set_empty::<T>(&key_on_error, e.to_string());
                        Err(e)
                    }
                }
            }
            .boxed()
            .shared();
            CacheEntry::pending(value)
        });
        entry.value.await
    }
}

/// `Some(0)` means unlimited; `None` means the configured default.
fn page_limit(requested: Option<usize>, default: usize) -> Option<usize> {
    match requested {
        Some(0) => None,
        Some(n) => Some(n),
        None if default == 0 => None,
        None => Some(default),
    }
}

fn expected_none(e: &GitError) -> bool {
    e.is_not_a_repository() || e.is_not_tracked()
}

async fn run_owned(
    runner: Arc<GitRunner>,
    repo_path: &Path,
    args: Vec<String>,
    stdin: Option<String>,
) -> Result<String, GitError> {
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    match stdin {
        Some(input) => runner.run_with_stdin(repo_path, &arg_refs, &input).await,
        None => runner.run(repo_path, &arg_refs).await,
    }
}

/// Shared log fetch used by plain, file-scoped, and pagination paths.
async fn fetch_log(
    runner: Arc<GitRunner>,
    repo_path: PathBuf,
    query: LogQuery,
    reference_override: Option<String>,
    limit: Option<usize>,
    similarity: u8,
) -> Result<Option<GitLog>, GitError> {
    let args = log_args(&query, reference_override.as_deref(), limit, similarity);
    match run_owned(runner, &repo_path, args, None).await {
        Ok(raw) => Ok(parse::log::parse_log(&repo_path, &raw, query, limit)),
        Err(e) if expected_none(&e) || e.is_bad_revision() => Ok(None),
        Err(e) => Err(e),
    }
}

fn log_args(
    query: &LogQuery,
    reference_override: Option<&str>,
    limit: Option<usize>,
    similarity: u8,
) -> Vec<String> {
    let mut args = vec![
        "log".to_string(),
        format!("--format={}", parse::log::LOG_FORMAT),
    ];
    if let Some(limit) = limit {
        args.push("-n".to_string());
        args.push((limit + 1).to_string());
    }
    for author in &query.authors {
        args.push(format!("--author={author}"));
    }
    if query.merges {
        args.push("--merges".to_string());
    }
    if query.reverse {
        args.push("--reverse".to_string());
    }
    if let (Some(range), Some(file)) = (query.range, &query.file) {
        args.push(format!("-L{},{}:{}", range.start, range.end, file.display()));
    } else if query.file.is_some() {
        args.push("--name-status".to_string());
        if query.renames {
            args.push("--follow".to_string());
        }
        args.push(format!("-M{similarity}%"));
    }
    let reference = reference_override.or(query.reference.as_deref());
    if let Some(reference) = reference {
        if !revision::is_sentinel(reference) {
            args.push(reference.to_string());
        }
    }
    if let (Some(file), None) = (&query.file, &query.range) {
        args.push("--".to_string());
        args.push(file.display().to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deleted_sentinel_short_circuits_without_spawning() {
        // A runner pointed at a nonexistent binary would error loudly
        // if any of these paths spawned a subprocess.
        let mut service = GitService::new(LoupeConfig::default());
        service.runner = Arc::new(GitRunner::with_git_path(PathBuf::from(
            "/nonexistent/git-binary",
        )));
        let service = service;

        let file = Path::new("/no/repo/file.txt");
        let deleted = revision::DELETED_OR_MISSING;
        assert!(service
            .blame_for_file(file, Some(deleted))
            .await
            .unwrap()
            .is_none());
        assert!(service
            .diff_for_file(file, Some(deleted), None)
            .await
            .unwrap()
            .is_none());
        assert!(service
            .diff_with_previous(file, Some(deleted))
            .await
            .unwrap()
            .is_none());
        assert!(service
            .content_for_file(file, deleted)
            .await
            .unwrap()
            .is_none());
        assert!(service
            .resolve_reference(Path::new("/tmp"), deleted)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn log_more_is_idempotent_when_exhausted() {
        let service = GitService::new(LoupeConfig::default());
        let mut log = GitLog::new(PathBuf::from("/repo"), LogQuery::for_ref(None));
        log.shas.push("c1".to_string());
        log.commits.insert(
            "c1".to_string(),
            GitCommit::new(
                crate::model::GitCommitType::Log,
                PathBuf::from("/repo"),
                "c1".to_string(),
            ),
        );
        log.count = 1;
        log.has_more = false;

        let extended = service.log_more(&log, MoreBy::Limit(5)).await.unwrap();
        assert!(!extended.has_more);
        assert_eq!(extended.count, 1);
        assert_eq!(extended.shas, log.shas);
    }

    #[test]
    fn log_args_for_plain_query() {
        let query = LogQuery::for_ref(Some("main".to_string()));
        let args = log_args(&query, None, Some(10), 50);
        assert_eq!(args[0], "log");
        assert!(args.contains(&"-n".to_string()));
        assert!(args.contains(&"11".to_string()));
        assert!(args.contains(&"main".to_string()));
        assert!(!args.iter().any(|a| a == "--name-status"));
    }

    #[test]
    fn log_args_for_file_query_with_renames() {
        let mut query = LogQuery::for_ref(None);
        query.file = Some(PathBuf::from("src/lib.rs"));
        query.renames = true;
        let args = log_args(&query, None, Some(5), 50);
        assert!(args.contains(&"--name-status".to_string()));
        assert!(args.contains(&"--follow".to_string()));
        assert!(args.contains(&"-M50%".to_string()));
        let sep = args.iter().position(|a| a == "--").unwrap();
        assert_eq!(args[sep + 1], "src/lib.rs");
    }

    #[test]
    fn log_args_for_line_range_uses_l_and_no_pathspec() {
        let mut query = LogQuery::for_ref(None);
        query.file = Some(PathBuf::from("src/lib.rs"));
        query.range = Some(LogRange { start: 3, end: 9 });
        let args = log_args(&query, None, None, 50);
        assert!(args.contains(&"-L3,9:src/lib.rs".to_string()));
        assert!(!args.contains(&"--".to_string()));
        assert!(!args.contains(&"--name-status".to_string()));
    }

    #[test]
    fn override_reference_wins_over_query_reference() {
        let query = LogQuery::for_ref(Some("main".to_string()));
        let args = log_args(&query, Some("abc^"), None, 50);
        assert!(args.contains(&"abc^".to_string()));
        assert!(!args.contains(&"main".to_string()));
    }

    #[test]
    fn page_limit_semantics() {
        assert_eq!(page_limit(None, 200), Some(200));
        assert_eq!(page_limit(Some(5), 200), Some(5));
        assert_eq!(page_limit(Some(0), 200), None);
        assert_eq!(page_limit(None, 0), None);
    }
}
