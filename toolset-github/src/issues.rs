//! Issue capabilities.

use serde::Serialize;
use serde_json::Value;
use toolset_primitives::{
    CapabilityDescriptor, PaginationParams, Property, Result, SchemaBuilder, params,
};
use toolset_registry::Toolset;

use crate::client::ApiRequest;
use crate::search::search_request;
use crate::support::{Client, RepoRef, RestCall, direction, repo_schema};
use crate::BuildResult;

/// Toolset name.
pub const TOOLSET: &str = "issues";

/// Issues toolset.
///
/// # Errors
///
/// Propagates capability and toolset construction failures.
pub fn toolset(client: &Client) -> BuildResult<Toolset> {
    let toolset = Toolset::new(TOOLSET, "GitHub Issues related tools")
        .add_read_capabilities([
            get_issue(client)?,
            list_issues(client)?,
            get_issue_comments(client)?,
            search_issues(client)?,
        ])?
        .add_mutating_capabilities([
            create_issue(client)?,
            add_issue_comment(client)?,
            update_issue(client)?,
        ])?;
    Ok(toolset)
}

fn issue_number() -> Property {
    Property::number("The number of the issue")
}

fn issue_path(args: &Value, suffix: &str) -> Result<String> {
    let repo = RepoRef::from_arguments(args)?;
    let number = params::required_int(args, "issue_number")?;
    Ok(repo.path(&format!("/issues/{number}{suffix}")))
}

/// `get_issue`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn get_issue(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("get_issue")
        .title("Get issue details")
        .description("Get details of a specific issue in a GitHub repository.")
        .read_only()
        .input_schema(repo_schema().required("issue_number", issue_number()).build())
        .handler(RestCall::new(client, "failed to get issue", |args| {
            Ok(ApiRequest::get(issue_path(args, "")?))
        }))
        .build()
}

/// `list_issues`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn list_issues(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("list_issues")
        .title("List issues")
        .description("List issues in a GitHub repository.")
        .read_only()
        .input_schema(
            repo_schema()
                .property(
                    "state",
                    Property::string("Filter by state").one_of(["open", "closed", "all"]),
                )
                .property("labels", Property::string_array("Filter by labels"))
                .property(
                    "sort",
                    Property::string("Sort order").one_of(["created", "updated", "comments"]),
                )
                .property("direction", direction("Sort direction"))
                .property(
                    "since",
                    Property::string("Filter by date (ISO 8601 timestamp)"),
                )
                .with_pagination()
                .build(),
        )
        .handler(RestCall::new(client, "failed to list issues", |args| {
            let repo = RepoRef::from_arguments(args)?;
            let labels = params::optional_string_array(args, "labels")?;
            let page = PaginationParams::from_arguments(args)?;
            Ok(ApiRequest::get(repo.path("/issues"))
                .query_opt("state", params::optional_string(args, "state")?)
                .query_opt("labels", (!labels.is_empty()).then(|| labels.join(",")))
                .query_opt("sort", params::optional_string(args, "sort")?)
                .query_opt("direction", params::optional_string(args, "direction")?)
                .query_opt("since", params::optional_string(args, "since")?)
                .queries(page.to_query()?))
        }))
        .build()
}

/// `get_issue_comments`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn get_issue_comments(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("get_issue_comments")
        .title("Get issue comments")
        .description("Get comments for a specific issue in a GitHub repository.")
        .read_only()
        .input_schema(
            repo_schema()
                .required("issue_number", issue_number())
                .with_pagination()
                .build(),
        )
        .handler(RestCall::new(client, "failed to get issue comments", |args| {
            let page = PaginationParams::from_arguments(args)?;
            Ok(ApiRequest::get(issue_path(args, "/comments")?).queries(page.to_query()?))
        }))
        .build()
}

/// `search_issues`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn search_issues(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("search_issues")
        .title("Search issues")
        .description(
            "Search for issues in GitHub repositories using issues search syntax already scoped to is:issue",
        )
        .read_only()
        .input_schema(
            SchemaBuilder::new()
                .required(
                    "query",
                    Property::string("Search query using GitHub issues search syntax"),
                )
                .property("owner", Property::string("Optional repository owner"))
                .property("repo", Property::string("Optional repository name"))
                .property(
                    "sort",
                    Property::string("Sort field, defaults to best match").one_of([
                        "comments",
                        "reactions",
                        "interactions",
                        "created",
                        "updated",
                    ]),
                )
                .property("order", direction("Sort order"))
                .with_pagination()
                .build(),
        )
        .handler(RestCall::new(client, "failed to search issues", |args| {
            search_request("/search/issues", Some("is:issue"), args)
        }))
        .build()
}

#[derive(Debug, Default, Serialize)]
struct IssueBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    assignees: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone: Option<i64>,
}

impl IssueBody {
    fn from_arguments(args: &Value) -> Result<Self> {
        Ok(Self {
            title: params::optional_string(args, "title")?,
            body: params::optional_string(args, "body")?,
            state: params::optional_string(args, "state")?,
            assignees: params::optional_string_array(args, "assignees")?,
            labels: params::optional_string_array(args, "labels")?,
            milestone: params::optional_int(args, "milestone")?.filter(|m| *m != 0),
        })
    }

    fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn issue_fields(builder: SchemaBuilder) -> SchemaBuilder {
    builder
        .property("body", Property::string("Issue body content"))
        .property(
            "assignees",
            Property::string_array("Usernames to assign to this issue"),
        )
        .property("labels", Property::string_array("Labels to apply to this issue"))
        .property("milestone", Property::number("Milestone number"))
}

/// `create_issue`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn create_issue(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("create_issue")
        .title("Open new issue")
        .description("Create a new issue in a GitHub repository.")
        .mutating()
        .input_schema(
            issue_fields(repo_schema().required("title", Property::string("Issue title"))).build(),
        )
        .handler(RestCall::new(client, "failed to create issue", |args| {
            let repo = RepoRef::from_arguments(args)?;
            params::required_string(args, "title")?;
            let body = IssueBody {
                state: None,
                ..IssueBody::from_arguments(args)?
            };
            Ok(ApiRequest::post(repo.path("/issues"), body.into_value()))
        }))
        .build()
}

/// `add_issue_comment`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn add_issue_comment(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("add_issue_comment")
        .title("Add comment to issue")
        .description("Add a comment to a specific issue in a GitHub repository.")
        .mutating()
        .input_schema(
            repo_schema()
                .required("issue_number", Property::number("Issue number to comment on"))
                .required("body", Property::string("Comment content"))
                .build(),
        )
        .handler(RestCall::new(client, "failed to create comment", |args| {
            let path = issue_path(args, "/comments")?;
            let body = params::required_string(args, "body")?;
            Ok(ApiRequest::post(path, serde_json::json!({ "body": body })))
        }))
        .build()
}

/// `update_issue`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn update_issue(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("update_issue")
        .title("Edit issue")
        .description("Update an existing issue in a GitHub repository.")
        .mutating()
        .input_schema(
            issue_fields(
                repo_schema()
                    .required("issue_number", Property::number("Issue number to update"))
                    .property("title", Property::string("New title"))
                    .property(
                        "state",
                        Property::string("New state").one_of(["open", "closed"]),
                    ),
            )
            .build(),
        )
        .handler(RestCall::new(client, "failed to update issue", |args| {
            let path = issue_path(args, "")?;
            Ok(ApiRequest::patch(path, IssueBody::from_arguments(args)?.into_value()))
        }))
        .build()
}
