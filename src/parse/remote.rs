use std::path::Path;

use crate::model::remote::{GitRemote, GitRemoteType};

/// Parse `git remote -v` output: `name<TAB>url (fetch|push)` lines,
/// deduplicated into one entry per remote name.
pub fn parse_remotes(repo_path: &Path, raw: &str) -> Option<Vec<GitRemote>> {
    if raw.trim().is_empty() {
        return None;
    }
    let mut remotes: Vec<GitRemote> = Vec::new();
    for line in raw.lines() {
        let Some((name, rest)) = line.split_once('\t') else { continue };
        let (url, kind) = match rest.rsplit_once(' ') {
            Some((url, "(fetch)")) => (url, GitRemoteType::Fetch),
            Some((url, "(push)")) => (url, GitRemoteType::Push),
            _ => (rest, GitRemoteType::Fetch),
        };
        if let Some(existing) = remotes.iter_mut().find(|r| r.name == name) {
            if !existing.types.contains(&kind) {
                existing.types.push(kind);
            }
            continue;
        }
        let (scheme, domain, path) = GitRemote::parse_url(url);
        remotes.push(GitRemote {
            repo_path: repo_path.to_path_buf(),
            name: name.to_string(),
            url: url.to_string(),
            scheme,
            domain,
            path,
            types: vec![kind],
        });
    }
    (!remotes.is_empty()).then_some(remotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupes_fetch_and_push_lines() {
        let raw = "origin\thttps://github.com/owner/repo.git (fetch)\n\
                   origin\thttps://github.com/owner/repo.git (push)\n\
                   upstream\tgit@github.com:other/repo.git (fetch)\n";
        let remotes = parse_remotes(Path::new("/repo"), raw).unwrap();
        assert_eq!(remotes.len(), 2);
        assert_eq!(remotes[0].name, "origin");
        assert_eq!(
            remotes[0].types,
            vec![GitRemoteType::Fetch, GitRemoteType::Push]
        );
        assert_eq!(remotes[0].domain, "github.com");
        assert_eq!(remotes[0].path, "owner/repo");
        assert_eq!(remotes[1].domain, "github.com");
        assert_eq!(remotes[1].path, "other/repo");
    }

    #[test]
    fn empty_is_none() {
        assert!(parse_remotes(Path::new("/repo"), "").is_none());
    }
}
