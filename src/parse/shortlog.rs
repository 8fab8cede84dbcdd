use crate::model::contributor::GitContributor;

/// Parse `git shortlog -s -e -n` output:
/// `   42<TAB>Alice Example <alice@example.com>` per line.
pub fn parse_shortlog(raw: &str) -> Option<Vec<GitContributor>> {
    if raw.trim().is_empty() {
        return None;
    }
    let mut contributors = Vec::new();
    for line in raw.lines() {
        let Some((count, rest)) = line.split_once('\t') else { continue };
        let commits = count.trim().parse().unwrap_or(0);
        let rest = rest.trim();
        let (name, email) = match rest.rsplit_once(" <") {
            Some((name, email)) => (
                name.trim().to_string(),
                Some(email.trim_end_matches('>').to_string()).filter(|e| !e.is_empty()),
            ),
            None => (rest.to_string(), None),
        };
        if name.is_empty() {
            continue;
        }
        contributors.push(GitContributor { name, email, commits });
    }
    (!contributors.is_empty()).then_some(contributors)
}
