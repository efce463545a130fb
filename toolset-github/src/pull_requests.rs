//! Pull request capabilities.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use toolset_primitives::{
    CallContext, CallError, CallOutcome, CallResult, CapabilityDescriptor, CapabilityHandler,
    PaginationParams, PaginationRequest, Property, Result, SchemaBuilder, params,
};
use toolset_registry::Toolset;
use tracing::debug;

use crate::client::ApiRequest;
use crate::support::{Client, RepoRef, RestCall, direction, repo_schema};
use crate::BuildResult;

/// Toolset name.
pub const TOOLSET: &str = "pull_requests";

/// Media type that makes the pulls endpoint return a unified diff.
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";

const REVIEWS_QUERY: &str = r"query($owner: String!, $repo: String!, $number: Int!, $first: Int!, $after: String) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $number) {
      reviews(first: $first, after: $after) {
        nodes { id state body submittedAt author { login } }
        pageInfo { hasNextPage endCursor }
        totalCount
      }
    }
  }
}";

/// Pull requests toolset.
///
/// # Errors
///
/// Propagates capability and toolset construction failures.
pub fn toolset(client: &Client) -> BuildResult<Toolset> {
    let toolset = Toolset::new(TOOLSET, "GitHub Pull Request related tools")
        .add_read_capabilities([
            get_pull_request(client)?,
            list_pull_requests(client)?,
            get_pull_request_files(client)?,
            get_pull_request_diff(client)?,
            list_pull_request_reviews(client)?,
        ])?
        .add_mutating_capabilities([
            create_pull_request(client)?,
            update_pull_request(client)?,
            merge_pull_request(client)?,
        ])?;
    Ok(toolset)
}

fn pull_number() -> Property {
    Property::number("Pull request number")
}

fn pull_schema() -> SchemaBuilder {
    repo_schema().required("pullNumber", pull_number())
}

fn pull_path(args: &Value, suffix: &str) -> Result<String> {
    let repo = RepoRef::from_arguments(args)?;
    let number = params::required_int(args, "pullNumber")?;
    Ok(repo.path(&format!("/pulls/{number}{suffix}")))
}

/// `get_pull_request`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn get_pull_request(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("get_pull_request")
        .title("Get pull request details")
        .description("Get details of a specific pull request in a GitHub repository.")
        .read_only()
        .input_schema(pull_schema().build())
        .handler(RestCall::new(client, "failed to get pull request", |args| {
            Ok(ApiRequest::get(pull_path(args, "")?))
        }))
        .build()
}

/// `list_pull_requests`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn list_pull_requests(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("list_pull_requests")
        .title("List pull requests")
        .description("List pull requests in a GitHub repository.")
        .read_only()
        .input_schema(
            repo_schema()
                .property(
                    "state",
                    Property::string("Filter by state").one_of(["open", "closed", "all"]),
                )
                .property("head", Property::string("Filter by head user/org and branch"))
                .property("base", Property::string("Filter by base branch"))
                .property(
                    "sort",
                    Property::string("Sort by").one_of([
                        "created",
                        "updated",
                        "popularity",
                        "long-running",
                    ]),
                )
                .property("direction", direction("Sort direction"))
                .with_pagination()
                .build(),
        )
        .handler(RestCall::new(client, "failed to list pull requests", |args| {
            let repo = RepoRef::from_arguments(args)?;
            let page = PaginationParams::from_arguments(args)?;
            Ok(ApiRequest::get(repo.path("/pulls"))
                .query_opt("state", params::optional_string(args, "state")?)
                .query_opt("head", params::optional_string(args, "head")?)
                .query_opt("base", params::optional_string(args, "base")?)
                .query_opt("sort", params::optional_string(args, "sort")?)
                .query_opt("direction", params::optional_string(args, "direction")?)
                .queries(page.to_query()?))
        }))
        .build()
}

/// `get_pull_request_files`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn get_pull_request_files(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("get_pull_request_files")
        .title("Get pull request files")
        .description("Get the files changed in a specific pull request.")
        .read_only()
        .input_schema(pull_schema().with_pagination().build())
        .handler(RestCall::new(client, "failed to get pull request files", |args| {
            let page = PaginationParams::from_arguments(args)?;
            Ok(ApiRequest::get(pull_path(args, "/files")?).queries(page.to_query()?))
        }))
        .build()
}

/// `get_pull_request_diff`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn get_pull_request_diff(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("get_pull_request_diff")
        .title("Get pull request diff")
        .description("Get the diff of a pull request.")
        .read_only()
        .input_schema(pull_schema().build())
        .handler(RestCall::new(client, "failed to get pull request diff", |args| {
            Ok(ApiRequest::get(pull_path(args, "")?).accept(DIFF_MEDIA_TYPE))
        }))
        .build()
}

/// `list_pull_request_reviews`
///
/// Accepts either page numbers or an `after` cursor; both are normalized
/// before the cursor-driven query runs.
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn list_pull_request_reviews(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("list_pull_request_reviews")
        .title("Get pull request reviews")
        .description("Get the reviews on a specific pull request.")
        .read_only()
        .input_schema(pull_schema().with_unified_pagination().build())
        .handler(ReviewsQuery {
            client: Arc::clone(client),
        })
        .build()
}

struct ReviewsQuery {
    client: Client,
}

const REVIEWS_CONTEXT: &str = "failed to get pull request reviews";

#[async_trait]
impl CapabilityHandler for ReviewsQuery {
    async fn call(&self, ctx: CallContext, arguments: Value) -> CallOutcome {
        let owner = params::required_string(&arguments, "owner")?;
        let repo = params::required_string(&arguments, "repo")?;
        let number = params::required_int(&arguments, "pullNumber")?;
        let cursor = PaginationRequest::from_arguments(&arguments)?.to_cursor()?;

        debug!(
            capability = ctx.capability(),
            first = cursor.first(),
            after = cursor.after(),
            "querying pull request reviews"
        );
        let variables = json!({
            "owner": owner,
            "repo": repo,
            "number": number,
            "first": cursor.first(),
            "after": cursor.after(),
        });
        let data = self
            .client
            .graphql(REVIEWS_QUERY, variables)
            .await
            .map_err(|err| CallError::remote(REVIEWS_CONTEXT, None, err.to_string()))?;

        match data.pointer("/repository/pullRequest/reviews") {
            Some(reviews) if !reviews.is_null() => CallResult::json(reviews),
            _ => Err(CallError::remote(
                REVIEWS_CONTEXT,
                None,
                format!("pull request {owner}/{repo}#{number} not found"),
            )),
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct PullRequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    head: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maintainer_can_modify: Option<bool>,
}

impl PullRequestBody {
    fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn optional_bool(args: &Value, key: &str) -> Result<Option<bool>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => params::optional_bool_or(args, key, false).map(Some),
    }
}

/// `create_pull_request`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn create_pull_request(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("create_pull_request")
        .title("Open new pull request")
        .description("Create a new pull request in a GitHub repository.")
        .mutating()
        .input_schema(
            repo_schema()
                .required("title", Property::string("PR title"))
                .required("head", Property::string("Branch containing changes"))
                .required("base", Property::string("Branch to merge into"))
                .property("body", Property::string("PR description"))
                .property("draft", Property::boolean("Create as draft PR"))
                .property(
                    "maintainer_can_modify",
                    Property::boolean("Allow maintainer edits"),
                )
                .build(),
        )
        .handler(RestCall::new(client, "failed to create pull request", |args| {
            let repo = RepoRef::from_arguments(args)?;
            let body = PullRequestBody {
                title: Some(params::required_string(args, "title")?),
                head: Some(params::required_string(args, "head")?),
                base: Some(params::required_string(args, "base")?),
                body: params::optional_string(args, "body")?,
                draft: optional_bool(args, "draft")?,
                maintainer_can_modify: optional_bool(args, "maintainer_can_modify")?,
                state: None,
            };
            Ok(ApiRequest::post(repo.path("/pulls"), body.into_value()))
        }))
        .build()
}

/// `update_pull_request`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn update_pull_request(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("update_pull_request")
        .title("Edit pull request")
        .description("Update an existing pull request in a GitHub repository.")
        .mutating()
        .input_schema(
            repo_schema()
                .required("pullNumber", Property::number("Pull request number to update"))
                .property("title", Property::string("New title"))
                .property("body", Property::string("New description"))
                .property(
                    "state",
                    Property::string("New state").one_of(["open", "closed"]),
                )
                .property("base", Property::string("New base branch name"))
                .property(
                    "maintainer_can_modify",
                    Property::boolean("Allow maintainer edits"),
                )
                .build(),
        )
        .handler(RestCall::new(client, "failed to update pull request", |args| {
            let path = pull_path(args, "")?;
            let body = PullRequestBody {
                title: params::optional_string(args, "title")?,
                body: params::optional_string(args, "body")?,
                state: params::optional_string(args, "state")?,
                base: params::optional_string(args, "base")?,
                maintainer_can_modify: optional_bool(args, "maintainer_can_modify")?,
                ..PullRequestBody::default()
            };
            Ok(ApiRequest::patch(path, body.into_value()))
        }))
        .build()
}

/// `merge_pull_request`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn merge_pull_request(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("merge_pull_request")
        .title("Merge pull request")
        .description("Merge a pull request in a GitHub repository.")
        .mutating()
        .input_schema(
            pull_schema()
                .property("commit_title", Property::string("Title for merge commit"))
                .property("commit_message", Property::string("Extra detail for merge commit"))
                .property(
                    "merge_method",
                    Property::string("Merge method").one_of(["merge", "squash", "rebase"]),
                )
                .build(),
        )
        .handler(RestCall::new(client, "failed to merge pull request", |args| {
            let path = pull_path(args, "/merge")?;
            let mut body = serde_json::Map::new();
            for key in ["commit_title", "commit_message", "merge_method"] {
                if let Some(value) = params::optional_string(args, key)? {
                    body.insert(key.to_owned(), Value::String(value));
                }
            }
            Ok(ApiRequest::put(path, Value::Object(body)))
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::client::Method;
    use crate::support::testing::{RecordingApi, invoke};

    #[tokio::test]
    async fn diff_requests_the_diff_media_type() {
        let api = RecordingApi::new();
        let capability = get_pull_request_diff(&api.client()).unwrap();
        invoke(&capability, json!({ "owner": "o", "repo": "r", "pullNumber": 3 }))
            .await
            .unwrap();

        let request = api.last_request();
        assert_eq!(request.path(), "/repos/o/r/pulls/3");
        assert_eq!(request.accept_header(), Some(DIFF_MEDIA_TYPE));
    }

    #[tokio::test]
    async fn reviews_translate_offset_pagination_to_a_cursor() {
        let api = RecordingApi::new();
        api.respond_graphql(json!({
            "repository": { "pullRequest": { "reviews": { "nodes": [], "totalCount": 0 } } }
        }));
        let capability = list_pull_request_reviews(&api.client()).unwrap();

        let result = invoke(
            &capability,
            json!({ "owner": "o", "repo": "r", "pullNumber": 9, "page": 3, "perPage": 20 }),
        )
        .await
        .unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(result.content()).unwrap()["totalCount"],
            0
        );

        let (_, variables) = api.queries().pop().unwrap();
        assert_eq!(variables["first"], 20);
        assert_eq!(variables["after"], Value::Null);
        assert_eq!(variables["number"], 9);
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn reviews_pass_the_cursor_through() {
        let api = RecordingApi::new();
        api.respond_graphql(json!({
            "repository": { "pullRequest": { "reviews": { "nodes": [] } } }
        }));
        let capability = list_pull_request_reviews(&api.client()).unwrap();

        invoke(
            &capability,
            json!({ "owner": "o", "repo": "r", "pullNumber": 9, "after": "Y3Vyc29y" }),
        )
        .await
        .unwrap();

        let (_, variables) = api.queries().pop().unwrap();
        assert_eq!(variables["first"], 30);
        assert_eq!(variables["after"], "Y3Vyc29y");
    }

    #[tokio::test]
    async fn reviews_for_a_missing_pull_request_fail_remotely() {
        let api = RecordingApi::new();
        api.respond_graphql(json!({ "repository": { "pullRequest": null } }));
        let capability = list_pull_request_reviews(&api.client()).unwrap();

        let err = invoke(&capability, json!({ "owner": "o", "repo": "r", "pullNumber": 1 }))
            .await
            .unwrap_err();
        assert!(err.is_caller_facing());
        assert!(err.to_string().starts_with(REVIEWS_CONTEXT));
    }

    #[tokio::test]
    async fn reviews_reject_oversized_pages_before_querying() {
        let api = RecordingApi::new();
        let capability = list_pull_request_reviews(&api.client()).unwrap();

        let err = invoke(
            &capability,
            json!({ "owner": "o", "repo": "r", "pullNumber": 1, "perPage": 101 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "perPage value 101 exceeds maximum of 100");
        assert!(api.queries().is_empty());
    }

    #[tokio::test]
    async fn merge_sends_only_supplied_fields() {
        let api = RecordingApi::new();
        let capability = merge_pull_request(&api.client()).unwrap();
        invoke(
            &capability,
            json!({ "owner": "o", "repo": "r", "pullNumber": 4, "merge_method": "squash" }),
        )
        .await
        .unwrap();

        let request = api.last_request();
        assert_eq!(request.method(), Method::Put);
        assert_eq!(request.path(), "/repos/o/r/pulls/4/merge");
        assert_eq!(request.body(), Some(&json!({ "merge_method": "squash" })));
    }

    #[tokio::test]
    async fn create_requires_head_and_base() {
        let api = RecordingApi::new();
        let capability = create_pull_request(&api.client()).unwrap();
        let err = invoke(
            &capability,
            json!({ "owner": "o", "repo": "r", "title": "Fix", "head": "fix" }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "missing required parameter: base");
    }

    #[test]
    fn lockdown_keeps_only_reads() {
        let api = RecordingApi::new();
        let toolset = toolset(&api.client()).unwrap().read_only();
        let names: Vec<_> = toolset
            .available_capabilities()
            .iter()
            .map(|c| c.name().to_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "get_pull_request",
                "list_pull_requests",
                "get_pull_request_files",
                "get_pull_request_diff",
                "list_pull_request_reviews",
            ]
        );
    }
}
