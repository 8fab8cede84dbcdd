use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use loupe::config::LoupeConfig;
use loupe::model::{GitFileStatus, MoreBy};
use loupe::process::GitRunner;
use loupe::service::search::SearchQuery;
use loupe::service::{FileLogOptions, GitService, LogOptions};

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_DATE", "2025-01-01T00:00:00Z")
        .env("GIT_COMMITTER_DATE", "2025-01-01T00:00:00Z")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn create_temp_repo() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init"]);
    git(dir.path(), &["config", "user.email", "test@test.com"]);
    git(dir.path(), &["config", "user.name", "Test"]);
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

fn add_and_commit(dir: &Path, filename: &str, content: &str, message: &str) -> String {
    std::fs::write(dir.join(filename), content).unwrap();
    git(dir, &["add", filename]);
    git(dir, &["commit", "-m", message]);
    git(dir, &["rev-parse", "HEAD"]).trim().to_string()
}

fn service() -> GitService {
    GitService::new(LoupeConfig::default())
}

#[tokio::test]
async fn blame_attributes_lines_to_commits() {
    let (_dir, root) = create_temp_repo();
    let c1 = add_and_commit(&root, "a.txt", "one\ntwo\n", "first");
    let c2 = add_and_commit(&root, "a.txt", "one\ntwo\nthree\n", "second");

    let service = service();
    let blame = service
        .blame_for_file(&root.join("a.txt"), None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(blame.lines.len(), 3);
    assert_eq!(blame.lines[0].sha, c1);
    assert_eq!(blame.lines[2].sha, c2);
    assert_eq!(blame.commits.get(&c2).unwrap().message, "second");

    // author totals cover every line
    let total: u32 = blame.authors.values().map(|a| a.line_count).sum();
    assert_eq!(total as usize, blame.lines.len());
}

#[tokio::test]
async fn blame_for_line_picks_the_right_commit() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "first");
    let c2 = add_and_commit(&root, "a.txt", "one\ntwo\n", "second");

    let service = service();
    let (record, commit) = service
        .blame_for_line(&root.join("a.txt"), 2, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.line, 2);
    assert_eq!(commit.sha, c2);
}

#[tokio::test]
async fn blame_of_untracked_file_is_none() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "first");
    std::fs::write(root.join("loose.txt"), "nope\n").unwrap();

    let service = service();
    let blame = service
        .blame_for_file(&root.join("loose.txt"), None)
        .await
        .unwrap();
    assert!(blame.is_none());
}

#[tokio::test]
async fn concurrent_blames_coalesce_to_one_result() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "first");

    let service = Arc::new(service());
    let file = root.join("a.txt");
    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        let file = file.clone();
        handles.push(tokio::spawn(async move {
            service.blame_for_file(&file, None).await.unwrap().unwrap()
        }));
    }
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    // every caller observes the identical resolved value
    for result in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], result));
    }
}

#[tokio::test]
async fn failing_git_caches_an_empty_sentinel() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "first");

    let broken = Arc::new(GitRunner::with_git_path(PathBuf::from(
        "/nonexistent/git-binary",
    )));
    let service = GitService::new(LoupeConfig::default()).with_runner(broken);
    let file = root.join("a.txt");

    // first call rejects
    assert!(service.blame_for_file(&file, None).await.is_err());

    // second call short-circuits to the cached empty sentinel
    let second = service.blame_for_file(&file, None).await.unwrap();
    assert!(second.is_none());

    // the original error text is preserved for diagnostics
    let canonical = tokio::fs::canonicalize(&file).await.unwrap();
    let doc = service.tracker().get(&canonical, None).unwrap();
    let entry = doc.get::<loupe::model::GitBlame>("blame").unwrap();
    assert!(entry.error_message.is_some());
}

#[tokio::test]
async fn file_log_paginates_and_merges() {
    let (_dir, root) = create_temp_repo();
    let c1 = add_and_commit(&root, "a.txt", "1\n", "first");
    let c2 = add_and_commit(&root, "a.txt", "1\n2\n", "second");
    let c3 = add_and_commit(&root, "a.txt", "1\n2\n3\n", "third");

    let service = service();
    let options = FileLogOptions {
        limit: Some(2),
        ..Default::default()
    };
    let log = service
        .log_for_file(&root.join("a.txt"), &options)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(log.shas, vec![c3.clone(), c2.clone()]);
    assert!(log.has_more);

    let merged = service.log_more(&log, MoreBy::Limit(1)).await.unwrap();
    assert_eq!(merged.shas, vec![c3, c2, c1]);
    assert_eq!(merged.count, 3);
    assert!(!merged.has_more);

    // exhausted: further calls return the log unchanged
    let again = service.log_more(&merged, MoreBy::Limit(1)).await.unwrap();
    assert_eq!(again.count, 3);
    assert!(!again.has_more);
}

#[tokio::test]
async fn log_more_until_fetches_the_gap_in_one_shot() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "1\n", "first");
    let c2 = add_and_commit(&root, "a.txt", "1\n2\n", "second");
    let c3 = add_and_commit(&root, "a.txt", "1\n2\n3\n", "third");
    let c4 = add_and_commit(&root, "a.txt", "1\n2\n3\n4\n", "fourth");

    let service = service();
    let options = FileLogOptions {
        limit: Some(2),
        ..Default::default()
    };
    let log = service
        .log_for_file(&root.join("a.txt"), &options)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(log.shas, vec![c4.clone(), c3.clone()]);

    let merged = service
        .log_more(&log, MoreBy::Until(c2.clone()))
        .await
        .unwrap();
    assert_eq!(merged.shas, vec![c4, c3, c2.clone()]);
    assert!(merged.has_more);

    // already-present sha is a no-op
    let again = service.log_more(&merged, MoreBy::Until(c2)).await.unwrap();
    assert_eq!(again.count, 3);
}

#[tokio::test]
async fn file_log_follows_renames() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "old.rs", "fn a() {}\n", "create");
    git(&root, &["mv", "old.rs", "new.rs"]);
    git(&root, &["commit", "-m", "rename"]);

    let service = service();
    let log = service
        .log_for_file(&root.join("new.rs"), &FileLogOptions::default())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(log.count, 2);
    let newest = log.commits_in_order().next().unwrap();
    assert_eq!(newest.previous_file_name.as_deref(), Some(Path::new("old.rs")));
}

#[tokio::test]
async fn repo_log_respects_authors_and_reverse() {
    let (_dir, root) = create_temp_repo();
    let c1 = add_and_commit(&root, "a.txt", "1\n", "first");
    let c2 = add_and_commit(&root, "a.txt", "1\n2\n", "second");

    let service = service();
    let log = service
        .log(
            &root,
            &LogOptions {
                reverse: true,
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(log.shas, vec![c1, c2]);

    let none = service
        .log(
            &root,
            &LogOptions {
                authors: vec!["Nobody".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn diff_reports_hunks_against_head() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\ntwo\nthree\n", "first");
    std::fs::write(root.join("a.txt"), "one\nTWO\nthree\n").unwrap();

    let service = service();
    let diff = service
        .diff_for_file(&root.join("a.txt"), Some("HEAD"), None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(diff.hunks.len(), 1);
    let hunk = &diff.hunks[0];
    assert_eq!(hunk.current.start, 2);
    assert_eq!(hunk.previous.start, 2);
}

#[tokio::test]
async fn status_reports_worktree_and_staged_files() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "first");
    std::fs::write(root.join("a.txt"), "changed\n").unwrap();
    std::fs::write(root.join("new.txt"), "fresh\n").unwrap();
    git(&root, &["add", "new.txt"]);

    let service = service();
    let status = service.status_for_repo(&root).await.unwrap().unwrap();
    assert!(status.branch.is_some());

    let modified = status.file(Path::new("a.txt")).unwrap();
    assert_eq!(modified.working_status, Some('M'));

    let added = status.file(Path::new("new.txt")).unwrap();
    assert!(added.is_staged());

    let one = service
        .status_for_file(&root.join("a.txt"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(one.working_status, Some('M'));
}

#[tokio::test]
async fn branches_are_cached_and_sorted_current_first() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "first");
    git(&root, &["branch", "aaa-other"]);

    let service = service();
    let repo = service.repository_for(&root).await.unwrap();

    let branches = service.branches(&repo).await.unwrap();
    assert_eq!(branches.len(), 2);
    assert!(branches[0].current);

    // second listing comes from the repository cache
    let cached = service.branches(&repo).await.unwrap();
    assert!(Arc::ptr_eq(&branches, &cached));
}

#[tokio::test]
async fn tags_listing_includes_annotation() {
    let (_dir, root) = create_temp_repo();
    let head = add_and_commit(&root, "a.txt", "one\n", "first");
    git(&root, &["tag", "-a", "v1.0", "-m", "release one"]);
    git(&root, &["tag", "light"]);

    let service = service();
    let repo = service.repository_for(&root).await.unwrap();
    let tags = service.tags(&repo).await.unwrap();

    assert_eq!(tags.len(), 2);
    let annotated = tags.iter().find(|t| t.name == "v1.0").unwrap();
    assert_eq!(annotated.sha, head);
    assert_eq!(annotated.message.as_deref(), Some("release one"));
}

#[tokio::test]
async fn stash_list_parses_entries() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "first");
    std::fs::write(root.join("a.txt"), "dirty\n").unwrap();
    git(&root, &["stash", "push", "-m", "wip work"]);

    let service = service();
    let stashes = service.stash_list(&root).await.unwrap().unwrap();
    assert_eq!(stashes.len(), 1);
    assert_eq!(stashes[0].name, "stash@{0}");
    assert_eq!(stashes[0].message, "wip work");
}

#[tokio::test]
async fn contributors_count_commits() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "first");
    add_and_commit(&root, "a.txt", "one\ntwo\n", "second");

    let service = service();
    let contributors = service.contributors(&root, None).await.unwrap().unwrap();
    assert_eq!(contributors.len(), 1);
    assert_eq!(contributors[0].name, "Test");
    assert_eq!(contributors[0].commits, 2);
}

#[tokio::test]
async fn reflog_records_commits() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "first");
    add_and_commit(&root, "a.txt", "one\ntwo\n", "second");

    let service = service();
    let reflog = service.reflog(&root, Some(10)).await.unwrap().unwrap();
    assert!(reflog.count >= 2);
    assert_eq!(reflog.records[0].command, "commit");
}

#[tokio::test]
async fn search_by_author_and_message() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "add the parser");
    add_and_commit(&root, "b.txt", "two\n", "fix the cache");

    let service = service();

    let by_message = service
        .log_for_search(&root, &SearchQuery::new("=:parser"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_message.count, 1);
    assert_eq!(
        by_message.commits_in_order().next().unwrap().summary(),
        "add the parser"
    );

    let by_author = service
        .log_for_search(&root, &SearchQuery::new("@:Test"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_author.count, 2);

    let nothing = service
        .log_for_search(&root, &SearchQuery::new("=:nonexistent-term"))
        .await
        .unwrap();
    assert!(nothing.is_none());
}

#[tokio::test]
async fn search_single_sha_short_circuits_to_lookup() {
    let (_dir, root) = create_temp_repo();
    let c1 = add_and_commit(&root, "a.txt", "one\n", "first");
    add_and_commit(&root, "a.txt", "one\ntwo\n", "second");

    let service = service();
    let log = service
        .log_for_search(&root, &SearchQuery::new(format!("#:{c1}")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(log.count, 1);
    assert_eq!(log.shas[0], c1);
    assert!(!log.has_more);
}

#[tokio::test]
async fn tree_and_content_at_revision() {
    let (_dir, root) = create_temp_repo();
    let c1 = add_and_commit(&root, "a.txt", "version 1\n", "first");
    add_and_commit(&root, "a.txt", "version 2\n", "second");

    let service = service();

    let entries = service.tree(&root, "HEAD", None).await.unwrap().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, PathBuf::from("a.txt"));

    let old = service
        .content_for_file(&root.join("a.txt"), &c1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&old), "version 1\n");

    let missing = service
        .content_for_file(&root.join("never.txt"), "HEAD")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn resolve_reference_handles_good_and_bad_refs() {
    let (_dir, root) = create_temp_repo();
    let head = add_and_commit(&root, "a.txt", "one\n", "first");

    let service = service();
    let resolved = service.resolve_reference(&root, "HEAD").await.unwrap();
    assert_eq!(resolved.as_deref(), Some(head.as_str()));

    let bad = service
        .resolve_reference(&root, "no-such-ref")
        .await
        .unwrap();
    assert!(bad.is_none());
}

#[tokio::test]
async fn not_a_repository_resolves_to_none() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();
    assert!(service.repository_for(dir.path()).await.is_none());
    let blame = service
        .blame_for_file(&dir.path().join("a.txt"), None)
        .await
        .unwrap();
    assert!(blame.is_none());
}

#[tokio::test]
async fn is_tracked_distinguishes_files() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "first");
    std::fs::write(root.join("loose.txt"), "x\n").unwrap();

    let service = service();
    assert!(service.is_tracked(&root.join("a.txt")).await.unwrap());
    assert!(!service.is_tracked(&root.join("loose.txt")).await.unwrap());
}

#[tokio::test]
async fn apply_patch_conflict_offers_retry() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\ntwo\nthree\n", "first");

    // a patch that no longer applies
    let patch = "--- a/a.txt\n+++ b/a.txt\n@@ -1,3 +1,3 @@\n one\n-completely different\n+replacement\n three\n";
    let service = service();
    let err = service.apply_patch(&root, patch, false).await.unwrap_err();
    assert!(err.is_patch_conflict());
}

#[tokio::test]
async fn file_change_statuses_in_log() {
    let (_dir, root) = create_temp_repo();
    add_and_commit(&root, "a.txt", "one\n", "add a");

    let service = service();
    let log = service
        .log_for_file(&root.join("a.txt"), &FileLogOptions::default())
        .await
        .unwrap()
        .unwrap();
    let commit = log.commits_in_order().next().unwrap();
    assert_eq!(commit.files.len(), 1);
    assert_eq!(commit.files[0].status, GitFileStatus::Added);
}
