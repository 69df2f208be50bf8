pub mod config;
pub mod error;
pub mod security;
pub mod svn;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult, Result, SvnError};
pub use svn::{
    Commit, CommitMetadata, Diff, Repository, RepositoryLocation, Revision, SvnExecutor,
    SvnVersion, TreeEntry, TreeResult,
};
