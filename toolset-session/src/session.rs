//! A connected caller and the capabilities it can invoke.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use toolset_primitives::{CallContext, CallResult, CapabilityDescriptor, SessionId};
use tracing::{debug, warn};

use crate::table::InvocationTable;
use crate::{SessionError, SessionResult};

/// One connected caller.
///
/// Sessions are created by [`ExposureBinder::connect`](crate::ExposureBinder::connect)
/// and only ever gain capabilities while alive.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    table: InvocationTable,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            id: SessionId::random(),
            table: InvocationTable::new(),
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    pub(crate) fn table(&self) -> &InvocationTable {
        &self.table
    }

    /// Whether `name` is currently invocable.
    #[must_use]
    pub fn has_capability(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    /// Number of bound capabilities.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.table.len()
    }

    /// Bound capability names, sorted.
    #[must_use]
    pub fn capability_names(&self) -> Vec<String> {
        self.table
            .list()
            .iter()
            .map(|descriptor| descriptor.name().to_owned())
            .collect()
    }

    /// Bound descriptors, sorted by name.
    #[must_use]
    pub fn capabilities(&self) -> Vec<Arc<CapabilityDescriptor>> {
        self.table.list()
    }

    /// Capability listing in the shape a protocol `tools/list` response uses.
    #[must_use]
    pub fn tool_listing(&self) -> Vec<Value> {
        self.table
            .list()
            .iter()
            .map(|descriptor| {
                json!({
                    "name": descriptor.name(),
                    "description": descriptor.description(),
                    "inputSchema": descriptor.input_schema(),
                    "annotations": descriptor.annotations(),
                })
            })
            .collect()
    }

    /// Invokes a bound capability.
    ///
    /// Arguments are validated against the capability's input schema first.
    /// Validation failures, parameter errors, remote failures and rejections
    /// come back as error results; only internal handler failures are
    /// returned as `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownCapability`] when `name` is not bound and
    /// [`SessionError::Handler`] for internal handler failures.
    pub async fn call(&self, name: &str, arguments: Value) -> SessionResult<CallResult> {
        let bound = self
            .table
            .get(name)
            .ok_or_else(|| SessionError::unknown_capability(name))?;

        let arguments = match arguments {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        if let Err(reason) = bound.validate(&arguments) {
            debug!(session_id = %self.id, capability = name, %reason, "arguments rejected");
            return Ok(CallResult::failure(format!(
                "invalid arguments for {name}: {reason}"
            )));
        }

        let ctx = CallContext::new(self.id, name);
        match bound.descriptor().invoke(ctx, arguments).await {
            Ok(result) => {
                debug!(
                    session_id = %self.id,
                    capability = name,
                    is_error = result.is_error(),
                    "capability invoked"
                );
                Ok(result)
            }
            Err(err) if err.is_caller_facing() => {
                debug!(session_id = %self.id, capability = name, error = %err, "capability returned an error result");
                Ok(CallResult::failure(err.to_string()))
            }
            Err(err) => {
                warn!(session_id = %self.id, capability = name, error = %err, "capability failed");
                Err(SessionError::Handler {
                    capability: name.to_owned(),
                    source: err,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use toolset_primitives::{CallError, Property, SchemaBuilder, params};

    fn bind(session: &Session, name: &str, outcome: fn(&str) -> Result<CallResult, CallError>) {
        let descriptor = CapabilityDescriptor::builder(name)
            .description("test capability")
            .read_only()
            .input_schema(
                SchemaBuilder::new()
                    .required("owner", Property::string("Repository owner"))
                    .build(),
            )
            .handler(move |_ctx: CallContext, args: Value| async move {
                let owner = params::required_string(&args, "owner")?;
                outcome(&owner)
            })
            .build()
            .unwrap();
        session.table().insert_if_absent(Arc::new(descriptor));
    }

    #[tokio::test]
    async fn dispatches_by_name() {
        let session = Session::new();
        bind(&session, "get_owner", |owner| Ok(CallResult::success(owner)));

        let result = session
            .call("get_owner", json!({ "owner": "octo" }))
            .await
            .unwrap();
        assert!(!result.is_error());
        assert_eq!(result.content(), "octo");
        assert_eq!(session.capability_names(), vec!["get_owner"]);
    }

    #[tokio::test]
    async fn unknown_capability_is_an_error() {
        let session = Session::new();
        let err = session
            .call("missing", Value::Null)
            .await
            .expect_err("not bound");
        assert!(matches!(err, SessionError::UnknownCapability { ref name } if name == "missing"));
    }

    #[tokio::test]
    async fn schema_violations_become_error_results() {
        let session = Session::new();
        bind(&session, "get_owner", |owner| Ok(CallResult::success(owner)));

        let result = session.call("get_owner", Value::Null).await.unwrap();
        assert!(result.is_error());
        assert!(result.content().starts_with("invalid arguments for get_owner"));
    }

    #[tokio::test]
    async fn caller_facing_failures_become_error_results() {
        let session = Session::new();
        bind(&session, "get_owner", |_| {
            Err(CallError::remote("failed to get owner", Some(404), "Not Found"))
        });

        let result = session
            .call("get_owner", json!({ "owner": "octo" }))
            .await
            .unwrap();
        assert!(result.is_error());
        assert_eq!(result.content(), "failed to get owner: Not Found");
    }

    #[tokio::test]
    async fn internal_failures_propagate() {
        let session = Session::new();
        bind(&session, "get_owner", |_| Err(CallError::internal("boom")));

        let err = session
            .call("get_owner", json!({ "owner": "octo" }))
            .await
            .expect_err("internal");
        assert!(matches!(err, SessionError::Handler { ref capability, .. } if capability == "get_owner"));
    }

    #[test]
    fn tool_listing_carries_schema_and_annotations() {
        let session = Session::new();
        bind(&session, "get_owner", |owner| Ok(CallResult::success(owner)));

        let listing = session.tool_listing();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0]["name"], "get_owner");
        assert_eq!(listing[0]["inputSchema"]["required"], json!(["owner"]));
        assert_eq!(listing[0]["annotations"]["readOnlyHint"], true);
    }
}
