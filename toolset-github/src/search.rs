//! Search capabilities.

use serde_json::Value;
use toolset_primitives::{
    CapabilityDescriptor, PaginationParams, Property, Result, SchemaBuilder, params,
};
use toolset_registry::Toolset;

use crate::client::ApiRequest;
use crate::support::{Client, RestCall, direction};
use crate::BuildResult;

/// Toolset name.
pub const TOOLSET: &str = "search";

/// Search toolset.
///
/// # Errors
///
/// Propagates capability and toolset construction failures.
pub fn toolset(client: &Client) -> BuildResult<Toolset> {
    let toolset = Toolset::new(TOOLSET, "Search across repositories, code and users")
        .add_read_capabilities([
            search_repositories(client)?,
            search_code(client)?,
            search_users(client)?,
        ])?;
    Ok(toolset)
}

/// Builds a `GET` against a search endpoint.
///
/// `qualifier` is prepended to the caller's query unless already present.
/// Optional `owner` and `repo` arguments scope the search to one repository.
pub(crate) fn search_request(endpoint: &str, qualifier: Option<&str>, args: &Value) -> Result<ApiRequest> {
    let query = params::required_string(args, "query")?;
    let owner = params::optional_string(args, "owner")?;
    let repo = params::optional_string(args, "repo")?;
    let page = PaginationParams::from_arguments(args)?;

    let mut terms = Vec::new();
    if let Some(qualifier) = qualifier.filter(|q| !query.contains(q)) {
        terms.push(qualifier.to_owned());
    }
    if let (Some(owner), Some(repo)) = (owner, repo) {
        terms.push(format!("repo:{owner}/{repo}"));
    }
    terms.push(query);

    Ok(ApiRequest::get(endpoint)
        .query("q", terms.join(" "))
        .query_opt("sort", params::optional_string(args, "sort")?)
        .query_opt("order", params::optional_string(args, "order")?)
        .queries(page.to_query()?))
}

/// `search_repositories`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn search_repositories(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("search_repositories")
        .title("Search repositories")
        .description("Search for GitHub repositories")
        .read_only()
        .input_schema(
            SchemaBuilder::new()
                .required("query", Property::string("Search query"))
                .with_pagination()
                .build(),
        )
        .handler(RestCall::new(client, "failed to search repositories", |args| {
            search_request("/search/repositories", None, args)
        }))
        .build()
}

/// `search_code`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn search_code(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("search_code")
        .title("Search code")
        .description("Search for code across GitHub repositories")
        .read_only()
        .input_schema(
            SchemaBuilder::new()
                .required(
                    "query",
                    Property::string("Search query using GitHub code search syntax"),
                )
                .property("sort", Property::string("Sort field ('indexed' only)"))
                .property("order", direction("Sort order"))
                .with_pagination()
                .build(),
        )
        .handler(RestCall::new(client, "failed to search code", |args| {
            search_request("/search/code", None, args)
        }))
        .build()
}

/// `search_users`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn search_users(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("search_users")
        .title("Search users")
        .description("Search for GitHub users")
        .read_only()
        .input_schema(
            SchemaBuilder::new()
                .required(
                    "query",
                    Property::string("Search query using GitHub users search syntax"),
                )
                .property(
                    "sort",
                    Property::string("Sort field by category")
                        .one_of(["followers", "repositories", "joined"]),
                )
                .property("order", direction("Sort order"))
                .with_pagination()
                .build(),
        )
        .handler(RestCall::new(client, "failed to search users", |args| {
            search_request("/search/users", Some("type:user"), args)
        }))
        .build()
}
