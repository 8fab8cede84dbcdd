use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GitRemoteType {
    Fetch,
    Push,
}

/// A configured remote, with its URL split into the pieces remote
/// providers key off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitRemote {
    pub repo_path: PathBuf,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    pub domain: String,
    pub path: String,
    pub types: Vec<GitRemoteType>,
}

impl GitRemote {
    /// Split a remote URL into (scheme, domain, path). Handles
    /// `https://host/owner/repo.git`, `git@host:owner/repo.git`, and
    /// `ssh://git@host/owner/repo`.
    pub fn parse_url(url: &str) -> (Option<String>, String, String) {
        if let Some((scheme, rest)) = url.split_once("://") {
            let rest = rest.trim_start_matches(|c: char| c == '/');
            // strip user@ credentials
            let rest = rest.rsplit_once('@').map(|(_, r)| r).unwrap_or(rest);
            let (domain, path) = rest.split_once('/').unwrap_or((rest, ""));
            let domain = domain.split(':').next().unwrap_or(domain);
            return (
                Some(scheme.to_string()),
                domain.to_string(),
                normalize_path(path),
            );
        }
        // scp-like: git@host:owner/repo.git
        if let Some((userhost, path)) = url.split_once(':') {
            let domain = userhost.rsplit_once('@').map(|(_, h)| h).unwrap_or(userhost);
            return (None, domain.to_string(), normalize_path(path));
        }
        (None, String::new(), normalize_path(url))
    }
}

fn normalize_path(path: &str) -> String {
    path.trim_matches('/')
        .trim_end_matches(".git")
        .to_string()
}
