pub mod settings;

pub use settings::{Config, ConfigError, LogConfig, LoggingConfig, SvnConfig};
