//! Configuration for the pyrunner host
//!
//! Loads the optional TOML config file and resolves it, together with the
//! environment and command-line overrides, into [`RunnerSettings`].

mod config;
mod context;
mod errors;
mod settings;

pub use config::{Config, CONFIG_KEYS, CONFIG_PATH_ENV};
pub use context::ContextConfig;
pub use errors::ConfigError;
pub use settings::{
    ModulePath, ModulePathSource, RunnerSettings, SettingsOverrides, DEFAULT_INTERVAL_SECS,
    MODULE_PATH_ENV,
};
