use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Capability grants and engine tuning for the embedded interpreter.
///
/// Only `allow_native_access` and `allow_create_process` are enforced by the
/// host. The remaining flags and `engine_options` are handed to interpreter
/// code as-is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ContextConfig {
    pub allow_native_access: bool,
    pub allow_create_process: bool,
    pub allow_experimental_options: bool,
    pub isolate_native_modules: bool,
    pub warn_experimental_features: bool,
    pub engine_options: BTreeMap<String, String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            allow_native_access: true,
            allow_create_process: true,
            allow_experimental_options: true,
            isolate_native_modules: true,
            warn_experimental_features: false,
            engine_options: default_engine_options(),
        }
    }
}

impl ContextConfig {
    /// Flags and engine options flattened into the string map published to
    /// the interpreter
    pub fn published_options(&self) -> BTreeMap<String, String> {
        let mut options = self.engine_options.clone();
        let flags = [
            ("allow_native_access", self.allow_native_access),
            ("allow_create_process", self.allow_create_process),
            ("allow_experimental_options", self.allow_experimental_options),
            ("isolate_native_modules", self.isolate_native_modules),
            ("warn_experimental_features", self.warn_experimental_features),
        ];
        for (name, value) in flags {
            options.insert(name.to_string(), value.to_string());
        }
        options
    }
}

fn default_engine_options() -> BTreeMap<String, String> {
    [
        ("gc.background_interval_ms", "1000"),
        ("gc.background_threshold_bytes", "1048576"),
        ("gc.background_minimum_bytes", "10485760"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_grant_everything() {
        let config = ContextConfig::default();
        assert!(config.allow_native_access);
        assert!(config.allow_create_process);
        assert!(!config.warn_experimental_features);
        assert_eq!(
            config.engine_options.get("gc.background_interval_ms").map(String::as_str),
            Some("1000")
        );
    }

    #[test]
    fn test_published_options_include_flags() {
        let config = ContextConfig {
            allow_create_process: false,
            ..ContextConfig::default()
        };
        let published = config.published_options();
        assert_eq!(
            published.get("allow_create_process").map(String::as_str),
            Some("false")
        );
        assert!(published.contains_key("gc.background_minimum_bytes"));
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let config: ContextConfig = toml::from_str("allow_native_access = false").unwrap();
        assert!(!config.allow_native_access);
        assert!(config.allow_create_process);
        assert_eq!(config.engine_options.len(), 3);
    }
}
