//! Packaged bootstrap resources
//!
//! By default resources come from the set compiled into the binary. When a
//! resources directory is configured it replaces that set entirely, so a
//! missing file there is an error rather than a silent fallback.

use crate::errors::BridgeError;
use crate::utils::RUNNER_SCRIPT;
use std::fs;
use std::path::{Path, PathBuf};

const EMBEDDED: &[(&str, &str)] = &[(RUNNER_SCRIPT, include_str!("../resources/runner.py"))];

#[derive(Debug, Clone, Default)]
pub struct Resources {
    dir: Option<PathBuf>,
}

impl Resources {
    pub fn embedded() -> Self {
        Self { dir: None }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn new(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::embedded(),
        }
    }

    /// Read the named resource as UTF-8 source
    pub fn load(&self, name: &str) -> Result<String, BridgeError> {
        match &self.dir {
            Some(dir) => {
                let path = dir.join(name);
                if !path.is_file() {
                    return Err(BridgeError::ResourceNotFound {
                        name: name.to_string(),
                        dir: dir.clone(),
                    });
                }
                Ok(fs::read_to_string(path)?)
            }
            None => EMBEDDED
                .iter()
                .find(|(embedded_name, _)| *embedded_name == name)
                .map(|(_, source)| (*source).to_string())
                .ok_or_else(|| BridgeError::ResourceNotFound {
                    name: name.to_string(),
                    dir: PathBuf::from("<embedded>"),
                }),
        }
    }
}
