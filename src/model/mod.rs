pub mod blame;
pub mod branch;
pub mod commit;
pub mod contributor;
pub mod diff;
pub mod log;
pub mod reflog;
pub mod remote;
pub mod stash;
pub mod status;
pub mod tag;
pub mod tree;

pub use blame::{GitAuthor, GitBlame, GitBlameLine};
pub use branch::{sort_branches, GitBranch};
pub use commit::{GitCommit, GitCommitType, GitFileChange, GitFileStatus};
pub use contributor::GitContributor;
pub use diff::{GitDiff, GitDiffHunk, GitDiffLine, GitDiffLineKind, GitDiffRange, GitDiffShortStat};
pub use log::{GitLog, LogCursor, LogQuery, LogRange, MoreBy};
pub use reflog::{GitReflog, GitReflogRecord};
pub use remote::{GitRemote, GitRemoteType};
pub use stash::GitStash;
pub use status::{GitStatus, GitStatusFile};
pub use tag::{sort_tags, GitTag};
pub use tree::{GitTreeEntry, GitTreeEntryKind};
