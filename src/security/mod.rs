pub mod validator;

pub use validator::{PathValidator, ValidationError, check_subcommand};

/// Allowlist of permitted svn subcommands
///
/// The executor refuses to spawn `svn` with any subcommand outside this list.
/// Everything on the read path is here, plus `mkdir` for the standard layout
/// created alongside a new repository.
///
/// Adding a new subcommand requires careful security review.
pub const ALLOWED_SVN_SUBCOMMANDS: &[&str] = &[
    // Read operations
    "info",
    "ls",
    "list",
    "cat",
    "log",
    "diff",
    // Repository bootstrap
    "mkdir",
];

/// Allowlist of permitted svnadmin subcommands
pub const ALLOWED_SVNADMIN_SUBCOMMANDS: &[&str] = &["create"];
