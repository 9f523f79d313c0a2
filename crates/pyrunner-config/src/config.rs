//! On-disk TOML configuration
//!
//! The file lives at `<config_dir>/pyrunner/pyrunner.toml` unless
//! `PYRUNNER_CONFIG` points somewhere else. A missing file is not an error;
//! every field is optional and resolved later by [`crate::RunnerSettings`].

use crate::context::ContextConfig;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "PYRUNNER_CONFIG";

const CONFIG_DIR_NAME: &str = "pyrunner";
const CONFIG_FILE_NAME: &str = "pyrunner.toml";

/// Keys accepted by `get`/`set`, in display order
pub const CONFIG_KEYS: &[&str] = &[
    "module-path",
    "interval-secs",
    "resources-dir",
    "cleanup-bindings",
];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_bindings: Option<bool>,
    #[serde(default)]
    pub context: ContextConfig,
}

impl Config {
    pub fn path() -> Result<PathBuf, ConfigError> {
        // Explicit override for tests and isolated runs
        if let Ok(env_path) = std::env::var(CONFIG_PATH_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "module-path" => self.module_path.clone(),
            "interval-secs" => self.interval_secs.map(|v| v.to_string()),
            "resources-dir" => self.resources_dir.clone(),
            "cleanup-bindings" => self.cleanup_bindings.map(|v| v.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "module-path" => self.module_path = Some(value),
            "interval-secs" => {
                let secs = value.trim().parse::<u64>().map_err(|_| invalid(key, &value))?;
                if secs == 0 {
                    return Err(ConfigError::InvalidInterval(secs));
                }
                self.interval_secs = Some(secs);
            }
            "resources-dir" => self.resources_dir = Some(value),
            "cleanup-bindings" => {
                let flag = value.trim().parse::<bool>().map_err(|_| invalid(key, &value))?;
                self.cleanup_bindings = Some(flag);
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.module_path.is_none()
            && self.interval_secs.is_none()
            && self.resources_dir.is_none()
            && self.cleanup_bindings.is_none()
            && self.context == ContextConfig::default()
    }

    pub fn values_iter(&self) -> Vec<(&'static str, String)> {
        CONFIG_KEYS
            .iter()
            .filter_map(|key| match self.get(key) {
                Ok(Some(value)) => Some((*key, value)),
                _ => None,
            })
            .collect()
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
