//! Introspection and control capabilities bound into every session.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolset_primitives::{
    CallContext, CallError, CallOutcome, CallResult, CapabilityDescriptor, CapabilityHandler,
    InputSchema, Property, SchemaBuilder, params,
};
use toolset_registry::{EnableOutcome, ToolsetGroup};

use crate::SessionResult;
use crate::binder::Exposure;

/// Lists every toolset with its enabled state.
pub const LIST_AVAILABLE_TOOLSETS: &str = "list_available_toolsets";
/// Lists the capabilities a toolset would expose.
pub const GET_TOOLSET_TOOLS: &str = "get_toolset_tools";
/// Enables a toolset in the running process.
pub const ENABLE_TOOLSET: &str = "enable_toolset";

/// Names reserved by the control capabilities.
pub const CONTROL_CAPABILITIES: [&str; 3] =
    [LIST_AVAILABLE_TOOLSETS, GET_TOOLSET_TOOLS, ENABLE_TOOLSET];

/// Entry returned by [`GET_TOOLSET_TOOLS`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ToolsetCapability {
    /// Capability name.
    pub name: String,
    /// Capability description.
    pub description: String,
    /// Owning toolset.
    pub toolset: String,
}

pub(crate) fn capabilities(exposure: &Exposure) -> SessionResult<Vec<Arc<CapabilityDescriptor>>> {
    let group = Arc::clone(exposure.group());
    let toolset_names = group.toolset_names();

    let list = CapabilityDescriptor::builder(LIST_AVAILABLE_TOOLSETS)
        .title("List available toolsets")
        .description(
            "List every toolset this server can offer together with whether it is enabled. \
             Use it when the currently available tools are not enough, then call \
             get_toolset_tools with one of the names to see what it contains.",
        )
        .read_only()
        .handler(ListToolsets {
            group: Arc::clone(&group),
        })
        .build()?;

    let get = CapabilityDescriptor::builder(GET_TOOLSET_TOOLS)
        .title("List all tools in a toolset")
        .description(
            "List the tools a toolset provides. Use it to decide whether enabling the \
             toolset would help with the task at hand.",
        )
        .read_only()
        .input_schema(toolset_schema(
            "The name of the toolset you want to get the tools for",
            &toolset_names,
        ))
        .handler(ToolsetTools { group })
        .build()?;

    let enable = CapabilityDescriptor::builder(ENABLE_TOOLSET)
        .title("Enable a toolset")
        .description(
            "Enable one of the toolsets this server provides. Call list_available_toolsets \
             and get_toolset_tools first to see what it will enable.",
        )
        .read_only()
        .input_schema(toolset_schema(
            "The name of the toolset to enable",
            &toolset_names,
        ))
        .handler(EnableToolset {
            exposure: exposure.clone(),
        })
        .build()?;

    Ok(vec![Arc::new(list), Arc::new(get), Arc::new(enable)])
}

fn toolset_schema(description: &str, toolset_names: &[String]) -> InputSchema {
    let mut property = Property::string(description);
    if !toolset_names.is_empty() {
        property = property.one_of(toolset_names.iter().cloned());
    }
    SchemaBuilder::new().required("toolset", property).build()
}

struct ListToolsets {
    group: Arc<ToolsetGroup>,
}

#[async_trait]
impl CapabilityHandler for ListToolsets {
    async fn call(&self, _ctx: CallContext, _arguments: Value) -> CallOutcome {
        CallResult::json(&self.group.list_toolsets())
    }
}

struct ToolsetTools {
    group: Arc<ToolsetGroup>,
}

#[async_trait]
impl CapabilityHandler for ToolsetTools {
    async fn call(&self, _ctx: CallContext, arguments: Value) -> CallOutcome {
        let name = params::required_string(&arguments, "toolset")?;
        let capabilities = self
            .group
            .available_capabilities(&name)
            .map_err(|err| CallError::rejected(err.to_string()))?;

        let listing: Vec<ToolsetCapability> = capabilities
            .iter()
            .map(|capability| ToolsetCapability {
                name: capability.name().to_owned(),
                description: capability.description().to_owned(),
                toolset: name.clone(),
            })
            .collect();
        CallResult::json(&listing)
    }
}

struct EnableToolset {
    exposure: Exposure,
}

#[async_trait]
impl CapabilityHandler for EnableToolset {
    async fn call(&self, _ctx: CallContext, arguments: Value) -> CallOutcome {
        let name = params::required_string(&arguments, "toolset")?;
        match self.exposure.enable(&name) {
            Ok(EnableOutcome::Enabled) => Ok(CallResult::success(format!("Toolset {name} enabled"))),
            Ok(EnableOutcome::AlreadyEnabled) => Ok(CallResult::success(format!(
                "Toolset {name} is already enabled"
            ))),
            Err(err) => Err(CallError::rejected(err.to_string())),
        }
    }
}
