pub mod admin;
pub mod diff;
pub mod executor;
pub mod parser;
pub mod repository;
pub mod revision;
pub mod types;
pub mod version;

// Re-export commonly used types
pub use admin::create_repository;
pub use diff::{Diff, DiffLine, DiffStats, FileDiff, Hunk, HunkRange, LineKind, parse_unified_diff};
pub use executor::{CommandOutput, CommandRunner, Program, SvnCommand, SvnExecutor};
pub use parser::{InfoEntry, LogEntry, parse_info, parse_listing, parse_log_entries};
pub use repository::{Repository, RepositoryLocation};
pub use revision::Revision;
pub use types::{Author, ChangedPath, Commit, CommitMetadata, NodeKind, Timestamp, TreeEntry, TreeResult};
pub use version::SvnVersion;
