//! src/config.rs
//! ============================================================================
//! # RegistryConfig: registry policy knobs
//!
//! Loaded from / saved to TOML. Every field has a default, so an empty file is
//! a valid config.
//!
//! ```toml
//! registration = "atomic"      # or "best_effort"
//! catch_panics = true
//! warn_on_duplicate = true
//! trace_dispatch = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RegistryError, RegistryResult};

/// What `register` does when one of a listener's declarations is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    /// Validate every declaration first; on error nothing is bound.
    #[default]
    Atomic,

    /// Bind declarations in order and stop at the first invalid one.
    /// Bindings added before the failure stay in place.
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Partial-registration behaviour.
    pub registration: RegistrationPolicy,

    /// Catch handler panics and keep dispatching. When false a panicking
    /// handler unwinds through `fire`.
    pub catch_panics: bool,

    /// Warn when a listener instance is registered while already bound.
    pub warn_on_duplicate: bool,

    /// Emit a trace line for every dispatched event.
    pub trace_dispatch: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registration: RegistrationPolicy::Atomic,
            catch_panics: true,
            warn_on_duplicate: true,
            trace_dispatch: false,
        }
    }
}

impl RegistryConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> RegistryResult<Self> {
        let path: &Path = path.as_ref();
        let content: String = std::fs::read_to_string(path).map_err(|e| {
            RegistryError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = Self::from_toml(&content)?;
        info!("Loaded registry config from {}", path.display());

        Ok(config)
    }

    pub fn from_toml(content: &str) -> RegistryResult<Self> {
        toml::from_str(content)
            .map_err(|e| RegistryError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> RegistryResult<()> {
        let path: &Path = path.as_ref();
        let content: String = toml::to_string_pretty(self)
            .map_err(|e| RegistryError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            RegistryError::Config(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    #[must_use]
    pub fn with_registration(mut self, registration: RegistrationPolicy) -> Self {
        self.registration = registration;
        self
    }

    #[must_use]
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: RegistryConfig = RegistryConfig::from_toml("").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.registration, RegistrationPolicy::Atomic);
        assert!(config.catch_panics);
    }

    #[test]
    fn test_partial_toml() {
        let config: RegistryConfig =
            RegistryConfig::from_toml("registration = \"best_effort\"\ntrace_dispatch = true\n")
                .unwrap();

        assert_eq!(config.registration, RegistrationPolicy::BestEffort);
        assert!(config.trace_dispatch);
        assert!(config.warn_on_duplicate);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err: RegistryError = RegistryConfig::from_toml("registration = \"sometimes\"").unwrap_err();
        assert_eq!(err.as_label(), "config");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");

        let config: RegistryConfig = RegistryConfig::default()
            .with_registration(RegistrationPolicy::BestEffort)
            .with_catch_panics(false);
        config.save_to_file(&path).unwrap();

        let loaded: RegistryConfig = RegistryConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err: RegistryError =
            RegistryConfig::load_from_file(dir.path().join("nope.toml")).unwrap_err();

        assert!(matches!(err, RegistryError::Config(ref msg) if msg.contains("nope.toml")));
    }
}
