//! Secret scanning alert capabilities.

use toolset_primitives::{CapabilityDescriptor, Property, Result, params};
use toolset_registry::Toolset;

use crate::client::ApiRequest;
use crate::support::{Client, RepoRef, RestCall, repo_schema};
use crate::BuildResult;

/// Toolset name.
pub const TOOLSET: &str = "secret_protection";

/// Secret protection toolset.
///
/// # Errors
///
/// Propagates capability and toolset construction failures.
pub fn toolset(client: &Client) -> BuildResult<Toolset> {
    let toolset = Toolset::new(
        TOOLSET,
        "Secret protection related tools, such as GitHub Secret Scanning",
    )
    .add_read_capabilities([
        get_secret_scanning_alert(client)?,
        list_secret_scanning_alerts(client)?,
    ])?;
    Ok(toolset)
}

/// `get_secret_scanning_alert`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn get_secret_scanning_alert(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("get_secret_scanning_alert")
        .title("Get secret scanning alert")
        .description("Get details of a specific secret scanning alert in a GitHub repository.")
        .read_only()
        .input_schema(
            repo_schema()
                .required("alertNumber", Property::number("The number of the alert."))
                .build(),
        )
        .handler(RestCall::new(client, "failed to get alert", |args| {
            let repo = RepoRef::from_arguments(args)?;
            let number = params::required_int(args, "alertNumber")?;
            Ok(ApiRequest::get(repo.path(&format!("/secret-scanning/alerts/{number}"))))
        }))
        .build()
}

/// `list_secret_scanning_alerts`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn list_secret_scanning_alerts(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("list_secret_scanning_alerts")
        .title("List secret scanning alerts")
        .description("List secret scanning alerts in a GitHub repository.")
        .read_only()
        .input_schema(
            repo_schema()
                .property(
                    "state",
                    Property::string("Filter by state").one_of(["open", "resolved"]),
                )
                .property(
                    "secret_type",
                    Property::string(
                        "A comma-separated list of secret types to return. All default secret patterns are returned.",
                    ),
                )
                .property(
                    "resolution",
                    Property::string("Filter by resolution").one_of([
                        "false_positive",
                        "wont_fix",
                        "revoked",
                        "pattern_edited",
                        "pattern_deleted",
                        "used_in_tests",
                    ]),
                )
                .build(),
        )
        .handler(RestCall::new(client, "failed to list alerts", |args| {
            let repo = RepoRef::from_arguments(args)?;
            Ok(ApiRequest::get(repo.path("/secret-scanning/alerts"))
                .query_opt("state", params::optional_string(args, "state")?)
                .query_opt("secret_type", params::optional_string(args, "secret_type")?)
                .query_opt("resolution", params::optional_string(args, "resolution")?))
        }))
        .build()
}
