//! Dependabot alert capabilities.

use toolset_primitives::{CapabilityDescriptor, Property, Result, params};
use toolset_registry::Toolset;

use crate::client::ApiRequest;
use crate::support::{Client, RepoRef, RestCall, repo_schema};
use crate::BuildResult;

/// Toolset name.
pub const TOOLSET: &str = "dependabot";

/// Dependabot toolset.
///
/// # Errors
///
/// Propagates capability and toolset construction failures.
pub fn toolset(client: &Client) -> BuildResult<Toolset> {
    let toolset = Toolset::new(TOOLSET, "Dependabot tools")
        .add_read_capabilities([get_dependabot_alert(client)?, list_dependabot_alerts(client)?])?;
    Ok(toolset)
}

/// `get_dependabot_alert`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn get_dependabot_alert(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("get_dependabot_alert")
        .title("Get dependabot alert")
        .description("Get details of a specific dependabot alert in a GitHub repository.")
        .read_only()
        .input_schema(
            repo_schema()
                .required("alertNumber", Property::number("The number of the alert."))
                .build(),
        )
        .handler(RestCall::new(client, "failed to get alert", |args| {
            let repo = RepoRef::from_arguments(args)?;
            let number = params::required_int(args, "alertNumber")?;
            Ok(ApiRequest::get(repo.path(&format!("/dependabot/alerts/{number}"))))
        }))
        .build()
}

/// `list_dependabot_alerts`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn list_dependabot_alerts(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("list_dependabot_alerts")
        .title("List dependabot alerts")
        .description("List dependabot alerts in a GitHub repository.")
        .read_only()
        .input_schema(
            repo_schema()
                .property(
                    "state",
                    Property::string("Filter dependabot alerts by state. Defaults to open")
                        .one_of(["open", "fixed", "dismissed", "auto_dismissed"])
                        .default_value("open".into()),
                )
                .property(
                    "severity",
                    Property::string("Filter dependabot alerts by severity")
                        .one_of(["low", "medium", "high", "critical"]),
                )
                .build(),
        )
        .handler(RestCall::new(client, "failed to list alerts", |args| {
            let repo = RepoRef::from_arguments(args)?;
            let state = params::optional_string(args, "state")?.unwrap_or_else(|| "open".to_owned());
            Ok(ApiRequest::get(repo.path("/dependabot/alerts"))
                .query("state", state)
                .query_opt("severity", params::optional_string(args, "severity")?))
        }))
        .build()
}
