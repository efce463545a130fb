//! Handler glue shared by the feature areas.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use toolset_primitives::{
    CallContext, CallError, CallOutcome, CallResult, CapabilityHandler, Property, Result,
    SchemaBuilder, params,
};
use tracing::debug;

use crate::client::{ApiRequest, RemoteApi};

/// Shared handle to the remote API.
pub type Client = Arc<dyn RemoteApi>;

/// `owner`/`repo` pair addressed by most capabilities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RepoRef {
    owner: String,
    repo: String,
}

impl RepoRef {
    pub(crate) fn from_arguments(args: &Value) -> Result<Self> {
        Ok(Self {
            owner: params::required_string(args, "owner")?,
            repo: params::required_string(args, "repo")?,
        })
    }

    /// `/repos/{owner}/{repo}` followed by `suffix`.
    pub(crate) fn path(&self, suffix: &str) -> String {
        format!(
            "/repos/{}/{}{suffix}",
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo)
        )
    }
}

/// Schema builder pre-populated with the required `owner` and `repo`.
pub(crate) fn repo_schema() -> SchemaBuilder {
    SchemaBuilder::new()
        .required("owner", Property::string("Repository owner"))
        .required("repo", Property::string("Repository name"))
}

/// Sort direction property shared by list and search capabilities.
pub(crate) fn direction(description: &str) -> Property {
    Property::string(description).one_of(["asc", "desc"])
}

type BuildRequest = fn(&Value) -> Result<ApiRequest>;

/// Handler that turns arguments into one REST request and returns the
/// response body verbatim.
pub(crate) struct RestCall {
    client: Client,
    context: &'static str,
    build: BuildRequest,
}

impl RestCall {
    pub(crate) fn new(client: &Client, context: &'static str, build: BuildRequest) -> Self {
        Self {
            client: Arc::clone(client),
            context,
            build,
        }
    }
}

#[async_trait]
impl CapabilityHandler for RestCall {
    async fn call(&self, ctx: CallContext, arguments: Value) -> CallOutcome {
        let request = (self.build)(&arguments)?;
        debug!(
            capability = ctx.capability(),
            method = %request.method(),
            path = request.path(),
            "calling remote api"
        );
        send(self.client.as_ref(), self.context, request).await
    }
}

/// Sends `request`, mapping transport failures and non-success statuses to
/// [`CallError::Remote`] tagged with `context`.
pub(crate) async fn send(client: &dyn RemoteApi, context: &str, request: ApiRequest) -> CallOutcome {
    let response = client
        .send(request)
        .await
        .map_err(|err| CallError::remote(context, None, err.to_string()))?;

    let status = response.status();
    if (200..300).contains(&status) {
        Ok(CallResult::success(response.into_body()))
    } else {
        Err(CallError::remote(context, Some(status), response.into_body()))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingApi, invoke};
    use super::*;

    use serde_json::json;
    use toolset_primitives::CapabilityDescriptor;

    use crate::client::{ApiResponse, RemoteError};

    fn get_repository(client: &Client) -> CapabilityDescriptor {
        CapabilityDescriptor::builder("get_repository")
            .description("Get repository details")
            .read_only()
            .input_schema(repo_schema().build())
            .handler(RestCall::new(client, "failed to get repository", |args| {
                let repo = RepoRef::from_arguments(args)?;
                Ok(ApiRequest::get(repo.path("")))
            }))
            .build()
            .unwrap()
    }

    #[test]
    fn repo_paths_encode_segments() {
        let repo = RepoRef::from_arguments(&json!({ "owner": "octo cat", "repo": "hello" })).unwrap();
        assert_eq!(repo.path("/issues"), "/repos/octo%20cat/hello/issues");
    }

    #[tokio::test]
    async fn success_passes_body_through() {
        let api = RecordingApi::new();
        api.respond(Ok(ApiResponse::new(200, r#"{"id":1}"#)));
        let capability = get_repository(&api.client());

        let result = invoke(&capability, json!({ "owner": "o", "repo": "r" }))
            .await
            .unwrap();
        assert_eq!(result.content(), r#"{"id":1}"#);
        assert_eq!(api.last_request().path(), "/repos/o/r");
    }

    #[tokio::test]
    async fn failures_carry_context_and_status() {
        let api = RecordingApi::new();
        api.respond(Ok(ApiResponse::new(404, "Not Found")));
        api.respond(Err(RemoteError::transport("connection reset")));
        let capability = get_repository(&api.client());
        let args = json!({ "owner": "o", "repo": "r" });

        let err = invoke(&capability, args.clone()).await.unwrap_err();
        assert!(matches!(err, CallError::Remote { status: Some(404), .. }));
        assert_eq!(err.to_string(), "failed to get repository: Not Found");

        let err = invoke(&capability, args).await.unwrap_err();
        assert!(matches!(err, CallError::Remote { status: None, .. }));
        assert!(err.is_caller_facing());
    }

    #[tokio::test]
    async fn missing_parameters_never_reach_the_remote() {
        let api = RecordingApi::new();
        let capability = get_repository(&api.client());

        let err = invoke(&capability, json!({ "owner": "o" })).await.unwrap_err();
        assert_eq!(err.to_string(), "missing required parameter: repo");
        assert!(api.requests().is_empty());
    }
}
