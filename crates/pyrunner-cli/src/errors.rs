//! Error type returned by CLI command handlers

use pyrunner_config::ConfigError;
use pyrunner_python::BridgeError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Python bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = CliError::from(ConfigError::MissingModulePath);
        let message = err.to_string();
        assert!(message.starts_with("Configuration error:"));
        assert!(message.contains("PYRUNNER_MODULE_PATH"));
    }

    #[test]
    fn test_bridge_error_display() {
        let err = CliError::from(BridgeError::LoaderMissing("load_all_py_files".to_string()));
        assert_eq!(
            err.to_string(),
            "Python bridge error: Missing required Python function: load_all_py_files"
        );
    }
}
