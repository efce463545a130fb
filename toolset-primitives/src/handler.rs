//! Handler contract for capability invocations.

use std::future::Future;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::{Error, SessionId};

/// Context handed to a handler alongside the validated arguments.
#[derive(Clone, Debug)]
pub struct CallContext {
    session_id: SessionId,
    capability: String,
}

impl CallContext {
    /// Creates a context for a call made by `session_id` to `capability`.
    #[must_use]
    pub fn new(session_id: SessionId, capability: impl Into<String>) -> Self {
        Self {
            session_id,
            capability: capability.into(),
        }
    }

    /// Session that issued the call.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Name of the invoked capability.
    #[must_use]
    pub fn capability(&self) -> &str {
        &self.capability
    }
}

/// Payload returned to the caller.
///
/// An error result is still a successful call at the protocol level: the
/// caller sees the message and can retry with corrected input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallResult {
    content: String,
    is_error: bool,
}

impl CallResult {
    /// Successful text result.
    #[must_use]
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Error result surfaced to the caller.
    #[must_use]
    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }

    /// Successful result carrying `value` serialized as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Internal`] when the value cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, CallError> {
        serde_json::to_string(value)
            .map(Self::success)
            .map_err(|err| CallError::internal(format!("failed to marshal result: {err}")))
    }

    /// Returns the textual content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns `true` for error results.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }

    /// Renders the result in MCP `CallToolResult` shape.
    #[must_use]
    pub fn to_protocol(&self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.content }],
            "isError": self.is_error,
        })
    }
}

/// Failures produced by handlers.
#[derive(Debug, Error)]
pub enum CallError {
    /// Arguments could not be read.
    #[error(transparent)]
    Parameter(#[from] Error),

    /// The remote service rejected or failed the request.
    #[error("{context}: {reason}")]
    Remote {
        /// What the handler was attempting.
        context: String,
        /// HTTP status reported by the remote service, if any.
        status: Option<u16>,
        /// Remote error message.
        reason: String,
    },

    /// The request was understood but refused, e.g. an unknown toolset.
    #[error("{0}")]
    Rejected(String),

    /// Handler-internal failure that the caller cannot fix.
    #[error("internal error: {reason}")]
    Internal {
        /// Human-readable context.
        reason: String,
    },
}

impl CallError {
    /// Creates a remote failure.
    #[must_use]
    pub fn remote(context: impl Into<String>, status: Option<u16>, reason: impl Into<String>) -> Self {
        Self::Remote {
            context: context.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Creates a rejection.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Creates an internal failure.
    #[must_use]
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Returns `true` when the caller should see this as an error result
    /// rather than a failed call.
    #[must_use]
    pub const fn is_caller_facing(&self) -> bool {
        !matches!(self, Self::Internal { .. })
    }
}

/// Result alias returned by handlers.
pub type CallOutcome = Result<CallResult, CallError>;

/// Trait implemented by capability handlers.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    /// Handles one call with arguments already validated against the schema.
    async fn call(&self, ctx: CallContext, arguments: Value) -> CallOutcome;
}

#[async_trait]
impl<F, Fut> CapabilityHandler for F
where
    F: Send + Sync + Fn(CallContext, Value) -> Fut,
    Fut: Future<Output = CallOutcome> + Send,
{
    async fn call(&self, ctx: CallContext, arguments: Value) -> CallOutcome {
        (self)(ctx, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closures_are_handlers() {
        let handler = |ctx: CallContext, args: Value| async move {
            Ok::<_, CallError>(CallResult::success(format!(
                "{}:{}",
                ctx.capability(),
                args["x"]
            )))
        };
        let ctx = CallContext::new(SessionId::random(), "echo");
        let result = handler.call(ctx, json!({ "x": 1 })).await.unwrap();
        assert_eq!(result.content(), "echo:1");
        assert!(!result.is_error());
    }

    #[test]
    fn protocol_shape_flags_errors() {
        let value = CallResult::failure("boom").to_protocol();
        assert_eq!(value["isError"], true);
        assert_eq!(value["content"][0]["text"], "boom");
    }

    #[test]
    fn only_internal_errors_escape_the_caller() {
        assert!(CallError::rejected("nope").is_caller_facing());
        assert!(CallError::remote("failed to get issue", Some(404), "Not Found").is_caller_facing());
        assert!(!CallError::internal("bug").is_caller_facing());
        assert_eq!(
            CallError::remote("failed to get issue", Some(404), "Not Found").to_string(),
            "failed to get issue: Not Found"
        );
    }
}
