//! GitHub feature-area toolsets.
//!
//! Each module builds one [`Toolset`] whose handlers translate call
//! arguments into requests against a [`RemoteApi`]. [`HttpRemoteApi`] is the
//! production implementation; tests substitute their own.

#![warn(missing_docs, clippy::pedantic)]

pub mod client;
pub mod code_security;
pub mod dependabot;
pub mod http;
pub mod issues;
pub mod pull_requests;
pub mod search;
pub mod secret_protection;

mod support;

use thiserror::Error;
use toolset_registry::{Toolset, ToolsetError, ToolsetGroup};
use tracing::info;

pub use client::{ApiRequest, ApiResponse, Method, RemoteApi, RemoteError, RemoteResult};
pub use http::{HttpConfig, HttpRemoteApi};
pub use support::Client;

/// Result alias for toolset construction.
pub type BuildResult<T> = Result<T, BuildError>;

/// Failures while assembling the feature-area toolsets.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A capability descriptor was malformed.
    #[error(transparent)]
    Capability(#[from] toolset_primitives::Error),

    /// A toolset rejected a capability or collided with another.
    #[error(transparent)]
    Toolset(#[from] ToolsetError),
}

/// Every feature-area toolset, in registration order.
///
/// # Errors
///
/// Propagates the first construction failure.
pub fn all_toolsets(client: &Client) -> BuildResult<Vec<Toolset>> {
    Ok(vec![
        code_security::toolset(client)?,
        dependabot::toolset(client)?,
        issues::toolset(client)?,
        pull_requests::toolset(client)?,
        search::toolset(client)?,
        secret_protection::toolset(client)?,
    ])
}

/// Registry holding every feature area, all disabled.
///
/// With `read_only` set the group suppresses mutating capabilities of every
/// toolset it holds.
///
/// # Errors
///
/// Propagates construction failures and capability name collisions.
pub fn default_toolset_group(client: &Client, read_only: bool) -> BuildResult<ToolsetGroup> {
    let group = ToolsetGroup::new(read_only);
    for toolset in all_toolsets(client)? {
        group.add_toolset(toolset);
    }
    group.validate_unique_names(&[])?;
    info!(
        toolsets = group.toolset_names().len(),
        read_only, "github toolsets registered"
    );
    Ok(group)
}
