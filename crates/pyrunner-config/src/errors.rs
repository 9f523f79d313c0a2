use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::settings::ModulePathSource;

/// Errors raised while loading or validating runner configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Python module path is not configured: pass --module-path, set {env}, or add `module_path` to the config file",
        env = crate::MODULE_PATH_ENV
    )]
    MissingModulePath,

    #[error("Python module path from {origin} must not be blank")]
    BlankModulePath { origin: ModulePathSource },

    #[error("Interval must be at least one second, got {0}")]
    InvalidInterval(u64),

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for key '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("Could not determine the user configuration directory")]
    NoConfigDir,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
