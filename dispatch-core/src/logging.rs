//! Tracing setup for hosts embedding the registry.
//!
//! The library itself only emits `tracing` events (handler failures at
//! `error`, registration changes at `debug`, per-dispatch lines at `trace`).
//! Hosts that do not install their own subscriber can call [`init_tracing`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Default filter directive, e.g. `info` or `dispatch_core=trace`.
    /// `RUST_LOG` directives are applied on top.
    pub log_level: String,

    /// Colored output.
    pub ansi: bool,

    /// Include the event target (module path) in each line.
    pub with_target: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ansi: true,
            with_target: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Invalid log level '{level}': {reason}")]
    InvalidLevel { level: String, reason: String },
}

pub(crate) fn build_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggingError> {
    let env: Option<String> = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    build_filter_with_env(config, env.as_deref())
}

/// Start from the configured directive, then layer `env` directives over it
/// so they win for the same target. Unparseable env entries are ignored.
fn build_filter_with_env(config: &LoggerConfig, env: Option<&str>) -> Result<EnvFilter, LoggingError> {
    let directive: Directive =
        Directive::from_str(&config.log_level).map_err(|e| LoggingError::InvalidLevel {
            level: config.log_level.clone(),
            reason: e.to_string(),
        })?;

    let mut filter: EnvFilter = EnvFilter::default().add_directive(directive);

    let overrides = env
        .into_iter()
        .flat_map(|raw: &str| raw.split(','))
        .map(str::trim)
        .filter(|raw: &&str| !raw.is_empty())
        .filter_map(|raw: &str| Directive::from_str(raw).ok());

    for directive in overrides {
        filter = filter.add_directive(directive);
    }

    Ok(filter)
}

/// Install a global `fmt` subscriber.
///
/// # Errors
/// `InvalidLevel` for a bad directive, `AlreadyInitialized` if a global
/// subscriber is already set.
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggingError> {
    let filter: EnvFilter = build_filter(config)?;

    let fmt_layer = fmt::layer()
        .with_ansi(config.ansi)
        .with_target(config.with_target);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}
