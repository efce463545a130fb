//! Errors produced by toolset construction and enablement.

use thiserror::Error;
use toolset_primitives::Safety;

/// Result alias for toolset operations.
pub type ToolsetResult<T> = Result<T, ToolsetError>;

/// Errors produced by toolset construction and enablement.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolsetError {
    /// No toolset is registered under the requested name.
    #[error("toolset {name} does not exist")]
    ToolsetNotFound {
        /// The requested name.
        name: String,
    },

    /// A capability was placed in the list that contradicts its declared
    /// safety. Startup must not continue past this.
    #[error(
        "capability `{capability}` in toolset `{toolset}` is declared {declared} but was added as {expected}"
    )]
    ContractViolation {
        /// Toolset being assembled.
        toolset: String,
        /// Offending capability.
        capability: String,
        /// Safety the capability declares.
        declared: Safety,
        /// Safety required by the list it was added to.
        expected: Safety,
    },

    /// Two capabilities share a name across the registry.
    #[error("capability `{name}` is registered by both `{first}` and `{second}`")]
    DuplicateCapability {
        /// The shared capability name.
        name: String,
        /// Owner seen first.
        first: String,
        /// Owner seen second.
        second: String,
    },
}

impl ToolsetError {
    /// Creates a [`ToolsetError::ToolsetNotFound`].
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::ToolsetNotFound { name: name.into() }
    }

    /// Returns `true` for [`ToolsetError::ToolsetNotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ToolsetNotFound { .. })
    }

    /// Returns `true` for errors that must abort startup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ContractViolation { .. } | Self::DuplicateCapability { .. }
        )
    }
}
