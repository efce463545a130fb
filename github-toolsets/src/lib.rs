//! GitHub capability toolsets facade.
//!
//! Depend on this crate via `cargo add github-toolsets`. It bundles the
//! internal crates behind feature flags so downstream servers can pick the
//! layers they need.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use toolset_primitives as primitives;

/// Toolsets and the registry that enables them (enabled by `registry` feature).
#[cfg(feature = "registry")]
pub use toolset_registry as registry;

/// Live sessions, exposure binding and control capabilities (enabled by `session` feature).
#[cfg(feature = "session")]
pub use toolset_session as session;

/// Server configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use toolset_config as config;

/// Logging setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use toolset_telemetry as telemetry;

/// GitHub feature areas and the HTTP client (enabled by `github` feature).
#[cfg(feature = "github")]
pub use toolset_github as github;
