//! Errors produced by sessions and the exposure binder.

use thiserror::Error;
use toolset_primitives::CallError;
use toolset_registry::ToolsetError;

/// Result alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors produced by sessions and the exposure binder.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session has no capability bound under this name.
    #[error("capability `{name}` is not available in this session")]
    UnknownCapability {
        /// The requested name.
        name: String,
    },

    /// A handler failed in a way the caller cannot act on.
    #[error("capability `{capability}` failed")]
    Handler {
        /// Capability that was invoked.
        capability: String,
        /// Underlying failure.
        #[source]
        source: CallError,
    },

    /// Registry validation failed while preparing the binder.
    #[error(transparent)]
    Toolset(#[from] ToolsetError),

    /// A control capability could not be constructed.
    #[error(transparent)]
    Capability(#[from] toolset_primitives::Error),
}

impl SessionError {
    /// Creates a [`SessionError::UnknownCapability`].
    #[must_use]
    pub fn unknown_capability(name: impl Into<String>) -> Self {
        Self::UnknownCapability { name: name.into() }
    }
}
