//! Shared error definitions for capability primitives.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the toolset workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Bound violated by a pagination value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageBound {
    /// The value was below the inclusive minimum.
    Min(i64),
    /// The value was above the inclusive maximum.
    Max(i64),
}

impl fmt::Display for PageBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Min(min) => write!(f, "is below minimum of {min}"),
            Self::Max(max) => write!(f, "exceeds maximum of {max}"),
        }
    }
}

/// Errors that can occur while building capabilities or reading call arguments.
#[derive(Debug, Error)]
pub enum Error {
    /// Capability name failed validation.
    #[error("invalid capability name `{name}`: {reason}")]
    InvalidCapabilityName {
        /// The offending name.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Capability definition failed validation.
    #[error("invalid capability: {reason}")]
    InvalidCapability {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A required call argument was absent or empty.
    #[error("missing required parameter: {name}")]
    MissingParameter {
        /// Name of the missing parameter.
        name: String,
    },

    /// A call argument was present but unusable.
    #[error("parameter {name} {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: String,
        /// Human-readable reason, phrased to follow the parameter name.
        reason: String,
    },

    /// A pagination value fell outside its allowed range.
    #[error("{field} value {value} {bound}")]
    PaginationBounds {
        /// Parameter that carried the value (`page` or `perPage`).
        field: &'static str,
        /// The rejected value, as supplied.
        value: i64,
        /// The bound that was violated.
        bound: PageBound,
    },
}

impl Error {
    /// Creates an [`Error::InvalidParameter`] for the supplied parameter.
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::MissingParameter`] for the supplied parameter.
    #[must_use]
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Returns `true` when the error is a pagination bounds violation.
    #[must_use]
    pub const fn is_pagination_bounds(&self) -> bool {
        matches!(self, Self::PaginationBounds { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_message_names_value_and_bound() {
        let err = Error::PaginationBounds {
            field: "perPage",
            value: 150,
            bound: PageBound::Max(100),
        };
        assert_eq!(err.to_string(), "perPage value 150 exceeds maximum of 100");

        let err = Error::PaginationBounds {
            field: "perPage",
            value: 0,
            bound: PageBound::Min(1),
        };
        assert_eq!(err.to_string(), "perPage value 0 is below minimum of 1");
    }

    #[test]
    fn parameter_messages_read_naturally() {
        let err = Error::invalid_parameter("owner", "is not of type string, is number");
        assert_eq!(err.to_string(), "parameter owner is not of type string, is number");
        assert_eq!(
            Error::missing_parameter("repo").to_string(),
            "missing required parameter: repo"
        );
    }
}
