//! Resolution of the settings the runner actually uses
//!
//! Precedence for every value is: command line, then environment, then the
//! config file, then the built-in default. The module path has no default and
//! is validated exactly once here.

use crate::config::Config;
use crate::context::ContextConfig;
use crate::errors::ConfigError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted for the module path
pub const MODULE_PATH_ENV: &str = "PYRUNNER_MODULE_PATH";

/// Scheduling period used when nothing else is configured
pub const DEFAULT_INTERVAL_SECS: u64 = 10;

/// Where the module path was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulePathSource {
    Cli,
    Environment,
    ConfigFile,
}

impl fmt::Display for ModulePathSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModulePathSource::Cli => write!(f, "command line"),
            ModulePathSource::Environment => write!(f, "environment variable {}", MODULE_PATH_ENV),
            ModulePathSource::ConfigFile => write!(f, "config file"),
        }
    }
}

/// A validated, non-blank directory where interpreter-loadable modules live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePath(String);

impl ModulePath {
    pub fn parse(value: impl Into<String>, origin: ModulePathSource) -> Result<Self, ConfigError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ConfigError::BlankModulePath { origin });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub module_path: Option<String>,
    pub interval_secs: Option<u64>,
    pub resources_dir: Option<PathBuf>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub module_path: ModulePath,
    pub module_path_source: ModulePathSource,
    pub interval: Duration,
    pub resources_dir: Option<PathBuf>,
    pub cleanup_bindings: bool,
    pub context: ContextConfig,
}

impl RunnerSettings {
    /// Resolve settings against the process environment
    pub fn resolve(config: &Config, overrides: &SettingsOverrides) -> Result<Self, ConfigError> {
        Self::resolve_with(config, overrides, |key| std::env::var(key).ok())
    }

    /// Resolve settings with an explicit environment lookup
    pub fn resolve_with<F>(
        config: &Config,
        overrides: &SettingsOverrides,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (raw_path, source) = if let Some(path) = overrides.module_path.clone() {
            (path, ModulePathSource::Cli)
        } else if let Some(path) = env(MODULE_PATH_ENV) {
            (path, ModulePathSource::Environment)
        } else if let Some(path) = config.module_path.clone() {
            (path, ModulePathSource::ConfigFile)
        } else {
            return Err(ConfigError::MissingModulePath);
        };
        let module_path = ModulePath::parse(raw_path, source)?;

        let interval_secs = overrides
            .interval_secs
            .or(config.interval_secs)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval_secs == 0 {
            return Err(ConfigError::InvalidInterval(interval_secs));
        }

        let resources_dir = overrides
            .resources_dir
            .clone()
            .or_else(|| config.resources_dir.as_ref().map(PathBuf::from));

        Ok(Self {
            module_path,
            module_path_source: source,
            interval: Duration::from_secs(interval_secs),
            resources_dir,
            cleanup_bindings: config.cleanup_bindings.unwrap_or(true),
            context: config.context.clone(),
        })
    }
}
