//! Startup configuration.
//!
//! [`ServerConfig`] decides which toolsets are enabled before the first
//! session connects, whether the registry is locked down to read-only
//! capabilities, and where the remote API lives.

#![warn(missing_docs, clippy::pedantic)]

use std::collections::HashMap;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use toolset_registry::{ALL_TOOLSETS, ToolsetGroup, UnknownToolsetPolicy};
use toolset_telemetry::TracingConfig;
use tracing::{debug, info};

/// Comma-separated toolsets to enable at startup.
pub const ENV_TOOLSETS: &str = "GITHUB_TOOLSETS";
/// Global read-only lockdown.
pub const ENV_READ_ONLY: &str = "GITHUB_READ_ONLY";
/// Let callers enable toolsets at runtime instead of enabling everything.
pub const ENV_DYNAMIC_TOOLSETS: &str = "GITHUB_DYNAMIC_TOOLSETS";
/// Fail startup on unknown toolset names.
pub const ENV_STRICT_TOOLSETS: &str = "GITHUB_STRICT_TOOLSETS";
/// Remote API base URL.
pub const ENV_API_URL: &str = "GITHUB_API_URL";
/// Log filter directives.
pub const ENV_LOG_FILTER: &str = "GITHUB_LOG_FILTER";

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Server startup configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Toolsets to enable before any session connects. `"all"` enables every
    /// toolset.
    pub toolsets: Vec<String>,
    /// Hide every mutating capability.
    pub read_only: bool,
    /// Start with nothing but the control capabilities enabled when `"all"`
    /// is requested.
    pub dynamic_toolsets: bool,
    /// Reject unknown names in [`ServerConfig::toolsets`] instead of skipping
    /// them.
    pub strict_toolsets: bool,
    /// Remote API base URL.
    pub api_url: String,
    /// Logging setup.
    pub tracing: TracingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            toolsets: vec![ALL_TOOLSETS.to_owned()],
            read_only: false,
            dynamic_toolsets: false,
            strict_toolsets: false,
            api_url: DEFAULT_API_URL.to_owned(),
            tracing: TracingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_lookup`].
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from a key-value map.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_lookup`].
    pub fn from_map(values: &HashMap<String, String>) -> anyhow::Result<Self> {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    /// Loads the configuration through `lookup`, starting from the defaults.
    /// Unset keys keep their default value.
    ///
    /// # Errors
    ///
    /// Returns an error when a boolean variable is not a recognised boolean
    /// or the resulting configuration fails [`ServerConfig::validate`].
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TOOLSETS) {
            config.toolsets = split_list(&raw);
        }
        if let Some(raw) = lookup(ENV_READ_ONLY) {
            config.read_only = parse_bool(ENV_READ_ONLY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DYNAMIC_TOOLSETS) {
            config.dynamic_toolsets = parse_bool(ENV_DYNAMIC_TOOLSETS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_STRICT_TOOLSETS) {
            config.strict_toolsets = parse_bool(ENV_STRICT_TOOLSETS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_API_URL) {
            config.api_url = raw.trim().trim_end_matches('/').to_owned();
        }
        if let Some(raw) = lookup(ENV_LOG_FILTER) {
            config.tracing.filter = raw;
        }

        config.validate()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Checks the configuration for values startup cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error for blank toolset names or an API URL that is not an
    /// absolute `http(s)` URL.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(position) = self.toolsets.iter().position(|name| name.trim().is_empty()) {
            bail!("toolset name at position {position} is empty");
        }

        let Some(rest) = self
            .api_url
            .strip_prefix("https://")
            .or_else(|| self.api_url.strip_prefix("http://"))
        else {
            bail!("api url `{}` must start with http:// or https://", self.api_url);
        };
        if rest.is_empty() || rest.starts_with('/') {
            bail!("api url `{}` has no host", self.api_url);
        }
        Ok(())
    }

    /// Names to enable at startup. In dynamic mode `"all"` is dropped so the
    /// caller discovers toolsets through the control capabilities.
    #[must_use]
    pub fn enabled_toolsets(&self) -> Vec<String> {
        self.toolsets
            .iter()
            .filter(|name| !(self.dynamic_toolsets && name.as_str() == ALL_TOOLSETS))
            .cloned()
            .collect()
    }

    /// Unknown-name policy for startup enablement.
    #[must_use]
    pub const fn unknown_policy(&self) -> UnknownToolsetPolicy {
        if self.strict_toolsets {
            UnknownToolsetPolicy::Strict
        } else {
            UnknownToolsetPolicy::Lenient
        }
    }

    /// Enables the configured toolsets in `group`.
    ///
    /// # Errors
    ///
    /// Returns an error when strict mode is on and a name is unknown.
    pub fn apply(&self, group: &ToolsetGroup) -> anyhow::Result<()> {
        let names = self.enabled_toolsets();
        group
            .enable_toolsets(names.as_slice(), self.unknown_policy())
            .context("failed to enable configured toolsets")?;
        info!(
            requested = ?names,
            read_only = group.is_read_only(),
            dynamic = self.dynamic_toolsets,
            "startup toolsets applied"
        );
        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_bool(key: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be a boolean, got `{other}`"),
    }
}
