use std::io;
use std::path::PathBuf;
use thiserror::Error;

// Import module-level errors for AppError
use crate::config::settings::ConfigError;
use crate::security::validator::ValidationError;

/// Errors that can occur during svn operations
#[derive(Debug, Error)]
pub enum SvnError {
    #[error("No repository loaded")]
    NotLoaded,

    #[error("Command '{command}' failed with exit code {exit_code}: {stderr}")]
    ToolExecutionFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Failed to parse svn output: {0}")]
    MalformedOutput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("Command '{command}' timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("Failed to execute {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("Repository already exists at {0}")]
    RepositoryExists(PathBuf),

    #[error("Svn version {0} is too old. Minimum required: 1.7")]
    SvnVersionTooOld(String),

    #[error("Failed to detect svn version: {0}")]
    SvnVersionDetectionFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<quick_xml::DeError> for SvnError {
    fn from(err: quick_xml::DeError) -> Self {
        SvnError::MalformedOutput(err.to_string())
    }
}

impl From<quick_xml::Error> for SvnError {
    fn from(err: quick_xml::Error) -> Self {
        SvnError::MalformedOutput(err.to_string())
    }
}

/// Top-level application error that wraps all module-specific errors
///
/// All module errors convert to AppError via the `From` trait, so the
/// binary can use `?` across module boundaries without losing context.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Svn error: {0}")]
    Svn(#[from] SvnError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Security validation error: {0}")]
    Security(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for svn operations
pub type Result<T> = std::result::Result<T, SvnError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
