//! Code scanning alert capabilities.

use toolset_primitives::{CapabilityDescriptor, Property, Result, params};
use toolset_registry::Toolset;

use crate::client::ApiRequest;
use crate::support::{Client, RepoRef, RestCall, repo_schema};
use crate::BuildResult;

/// Toolset name.
pub const TOOLSET: &str = "code_security";

/// Code security toolset.
///
/// # Errors
///
/// Propagates capability and toolset construction failures.
pub fn toolset(client: &Client) -> BuildResult<Toolset> {
    let toolset = Toolset::new(
        TOOLSET,
        "Code security related tools, such as GitHub Code Scanning",
    )
    .add_read_capabilities([
        get_code_scanning_alert(client)?,
        list_code_scanning_alerts(client)?,
    ])?;
    Ok(toolset)
}

/// `get_code_scanning_alert`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn get_code_scanning_alert(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("get_code_scanning_alert")
        .title("Get code scanning alert")
        .description("Get details of a specific code scanning alert in a GitHub repository.")
        .read_only()
        .input_schema(
            repo_schema()
                .required("alertNumber", Property::number("The number of the alert."))
                .build(),
        )
        .handler(RestCall::new(client, "failed to get alert", |args| {
            let repo = RepoRef::from_arguments(args)?;
            let number = params::required_int(args, "alertNumber")?;
            Ok(ApiRequest::get(repo.path(&format!("/code-scanning/alerts/{number}"))))
        }))
        .build()
}

/// `list_code_scanning_alerts`
///
/// # Errors
///
/// Fails only if the descriptor is malformed.
pub fn list_code_scanning_alerts(client: &Client) -> Result<CapabilityDescriptor> {
    CapabilityDescriptor::builder("list_code_scanning_alerts")
        .title("List code scanning alerts")
        .description("List code scanning alerts in a GitHub repository.")
        .read_only()
        .input_schema(
            repo_schema()
                .property(
                    "ref",
                    Property::string("The Git reference for the results you want to list."),
                )
                .property(
                    "state",
                    Property::string("Filter code scanning alerts by state. Defaults to open")
                        .one_of(["open", "closed", "dismissed", "fixed"])
                        .default_value("open".into()),
                )
                .property(
                    "severity",
                    Property::string("Filter code scanning alerts by severity").one_of([
                        "critical", "high", "medium", "low", "warning", "note", "error",
                    ]),
                )
                .property(
                    "tool_name",
                    Property::string("The name of the tool used for code scanning."),
                )
                .build(),
        )
        .handler(RestCall::new(client, "failed to list alerts", |args| {
            let repo = RepoRef::from_arguments(args)?;
            Ok(ApiRequest::get(repo.path("/code-scanning/alerts"))
                .query_opt("ref", params::optional_string(args, "ref")?)
                .query_opt("state", params::optional_string(args, "state")?)
                .query_opt("severity", params::optional_string(args, "severity")?)
                .query_opt("tool_name", params::optional_string(args, "tool_name")?))
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::client::{ApiResponse, RemoteError};
    use crate::support::testing::{RecordingApi, invoke};
    use toolset_primitives::CallError;

    #[tokio::test]
    async fn get_alert_addresses_the_alert() {
        let api = RecordingApi::new();
        let capability = get_code_scanning_alert(&api.client()).unwrap();
        invoke(&capability, json!({ "owner": "o", "repo": "r", "alertNumber": 42 }))
            .await
            .unwrap();
        assert_eq!(api.last_request().path(), "/repos/o/r/code-scanning/alerts/42");
    }

    #[tokio::test]
    async fn list_alerts_passes_filters() {
        let api = RecordingApi::new();
        api.respond(Ok(ApiResponse::new(200, "[]")));
        let capability = list_code_scanning_alerts(&api.client()).unwrap();
        let result = invoke(
            &capability,
            json!({ "owner": "o", "repo": "r", "severity": "high", "ref": "refs/heads/main" }),
        )
        .await
        .unwrap();
        assert_eq!(result.content(), "[]");

        let request = api.last_request();
        assert_eq!(request.query_value("severity"), Some("high"));
        assert_eq!(request.query_value("ref"), Some("refs/heads/main"));
        assert_eq!(request.query_value("state"), None);
    }

    #[tokio::test]
    async fn remote_failure_is_reported_with_context() {
        let api = RecordingApi::new();
        api.respond(Err(RemoteError::transport("timed out")));
        let capability = list_code_scanning_alerts(&api.client()).unwrap();
        let err = invoke(&capability, json!({ "owner": "o", "repo": "r" }))
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Remote { ref context, .. } if context == "failed to list alerts"));
    }
}
