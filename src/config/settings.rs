use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::svn::SvnExecutor;

/// Environment variable overriding the configured svn binary
pub const SVN_BIN_ENV: &str = "SVNVIEW_SVN_BIN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub svn: SvnConfig,
    pub log: LogConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SvnConfig {
    pub binary: String,
    pub admin_binary: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
    pub default_limit: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("svnview"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from a specific file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    /// Load the default file, falling back to defaults when it does not exist
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load() {
            Err(ConfigError::ReadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default_config())
            }
            Err(ConfigError::DirectoryNotFound) => Ok(Self::default_config()),
            other => other,
        }
    }

    /// Save configuration to a specific file
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        // Validate before saving
        self.validate()?;

        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::config_path()?)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            svn: SvnConfig {
                binary: "svn".to_string(),
                admin_binary: "svnadmin".to_string(),
                timeout_seconds: 30,
            },
            log: LogConfig { default_limit: 10 },
            logging: LoggingConfig {
                filter: "svnview=info".to_string(),
            },
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.svn.binary.trim().is_empty() || self.svn.admin_binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "svn binaries must not be empty".to_string(),
            ));
        }

        if self.svn.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.log.default_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "default_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// The svn binary, preferring the environment override
    pub fn svn_binary(&self) -> String {
        match std::env::var(SVN_BIN_ENV) {
            Ok(binary) if !binary.is_empty() => binary,
            _ => self.svn.binary.clone(),
        }
    }

    /// Build an executor from these settings
    pub fn executor(&self) -> SvnExecutor {
        SvnExecutor::with_binaries(self.svn_binary(), self.svn.admin_binary.clone())
            .with_timeout(Duration::from_secs(self.svn.timeout_seconds))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
