use crate::security::{ALLOWED_SVN_SUBCOMMANDS, ALLOWED_SVNADMIN_SUBCOMMANDS};
use crate::svn::executor::Program;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Subcommand not allowed: {0}")]
    DisallowedSubcommand(String),

    #[error("Path contains a control character: {0:?}")]
    ControlCharacter(String),

    #[error("Path escapes the repository root: {0}")]
    ParentTraversal(String),

    #[error("Repository location must be an absolute path: {0}")]
    RelativeLocation(String),

    #[error("Empty command")]
    EmptyCommand,
}

/// Check the first argument of an invocation against the allowlist for its program
///
/// A bare `--version` query carries no subcommand and is always allowed.
pub fn check_subcommand(program: Program, args: &[String]) -> Result<(), ValidationError> {
    let first = args.first().ok_or(ValidationError::EmptyCommand)?;

    if program == Program::Svn && first == "--version" {
        return Ok(());
    }

    let allowed = match program {
        Program::Svn => ALLOWED_SVN_SUBCOMMANDS,
        Program::SvnAdmin => ALLOWED_SVNADMIN_SUBCOMMANDS,
    };

    if allowed.contains(&first.as_str()) {
        Ok(())
    } else {
        Err(ValidationError::DisallowedSubcommand(first.clone()))
    }
}

/// Validates repository-relative paths supplied by callers
///
/// Paths are appended to the repository URL, so anything that could walk
/// out of the repository or smuggle a line break into tool output is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathValidator;

impl PathValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a path such as `/trunk/src/main.c`
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if path.chars().any(char::is_control) {
            return Err(ValidationError::ControlCharacter(path.to_string()));
        }

        if path.split('/').any(|segment| segment == "..") {
            return Err(ValidationError::ParentTraversal(path.to_string()));
        }

        Ok(())
    }
}
