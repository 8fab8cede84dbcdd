use std::fmt;

/// Parsed git version, compared when an operation needs a minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Parse the output of `git --version`, e.g.
    /// `git version 2.39.3 (Apple Git-146)`. Trailing vendor suffixes
    /// and missing components are tolerated.
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.trim().strip_prefix("git version ").unwrap_or(raw.trim());
        let numeric = rest.split_whitespace().next()?;
        let mut parts = numeric.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        let patch = parts
            .next()
            .map(|p| {
                // e.g. "3.windows" on msysgit builds
                p.chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect::<String>()
            })
            .and_then(|p| p.parse().ok())
            .unwrap_or(0);
        Some(Self { major, minor, patch })
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Porcelain v2 status output landed in git 2.11.
pub const STATUS_PORCELAIN_V2: GitVersion = GitVersion::new(2, 11, 0);
