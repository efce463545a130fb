//! Observability setup for toolset servers.
//!
//! Logs go to stderr so that stdout stays free for a stdio protocol
//! transport.

#![warn(missing_docs, clippy::pedantic)]

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Default filter directive when neither config nor `RUST_LOG` set one.
pub const DEFAULT_FILTER: &str = "info";

/// Subscriber settings.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// `EnvFilter` directives, e.g. `info,toolset_session=debug`.
    pub filter: String,
    /// Emit ANSI colour codes.
    pub ansi: bool,
    /// Include the event target in each line.
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_owned(),
            ansi: false,
            with_target: false,
        }
    }
}

impl TracingConfig {
    /// Config with the given filter directives.
    #[must_use]
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Self::default()
        }
    }
}

/// Parses filter directives.
///
/// # Errors
///
/// Returns an error naming the directives when they do not parse.
pub fn env_filter(directives: &str) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .with_context(|| format!("invalid log filter `{directives}`"))
}

/// Installs the global `fmt` subscriber. `RUST_LOG` overrides
/// [`TracingConfig::filter`] when set.
///
/// # Errors
///
/// Returns an error when the configured directives do not parse or a global
/// subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => env_filter(&config.filter)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info_without_colour() {
        let config = TracingConfig::default();
        assert_eq!(config.filter, "info");
        assert!(!config.ansi);
        assert!(!config.with_target);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: TracingConfig =
            serde_json::from_str(r#"{ "filter": "debug" }"#).unwrap();
        assert_eq!(config, TracingConfig::with_filter("debug"));
    }

    #[test]
    fn directives_are_checked() {
        assert!(env_filter("info,toolset_session=debug").is_ok());
        let err = env_filter("toolset_session=loud").expect_err("bad level");
        assert!(err.to_string().contains("toolset_session=loud"));
    }
}
