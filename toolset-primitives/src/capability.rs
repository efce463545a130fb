//! Capability descriptors shared across the toolset runtime.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::handler::{CallContext, CallOutcome, CapabilityHandler};
use crate::schema::InputSchema;

const MAX_NAME_LEN: usize = 128;
const MAX_TITLE_LEN: usize = 96;

/// Declared effect of a capability on remote state.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Safety {
    /// Never modifies remote state.
    ReadOnly,
    /// May create, change, or delete remote state.
    Mutating,
}

impl Safety {
    /// Returns `true` for [`Safety::ReadOnly`].
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

impl fmt::Display for Safety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => f.write_str("read-only"),
            Self::Mutating => f.write_str("mutating"),
        }
    }
}

/// Validated capability name.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityName(String);

impl CapabilityName {
    /// Creates a capability name after validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapabilityName`] if the name is empty, too long,
    /// or contains characters other than ASCII alphanumerics, `_`, `-`, `.`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CapabilityName> for String {
    fn from(value: CapabilityName) -> Self {
        value.0
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidCapabilityName {
            name: String::new(),
            reason: "name cannot be empty".into(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(Error::InvalidCapabilityName {
            name: name.into(),
            reason: format!("name length must be <= {MAX_NAME_LEN}"),
        });
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::InvalidCapabilityName {
            name: name.into(),
            reason: "name must contain ASCII alphanumeric, dash, underscore, or dot".into(),
        });
    }

    Ok(())
}

/// Hints advertised with a capability (MCP tool annotations).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    /// Human-facing title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Mirrors [`Safety::ReadOnly`].
    pub read_only_hint: bool,
}

/// Name and description pair used by introspection listings.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySummary {
    /// Capability name.
    pub name: String,
    /// Capability description.
    pub description: String,
}

/// Immutable description of one invocable capability.
#[derive(Clone)]
pub struct CapabilityDescriptor {
    name: CapabilityName,
    title: Option<String>,
    description: String,
    safety: Safety,
    input_schema: InputSchema,
    handler: Arc<dyn CapabilityHandler>,
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("name", &self.name)
            .field("safety", &self.safety)
            .field("handler", &"dyn CapabilityHandler")
            .finish_non_exhaustive()
    }
}

impl CapabilityDescriptor {
    /// Starts building a descriptor for the supplied name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> CapabilityBuilder {
        CapabilityBuilder {
            name: name.into(),
            title: None,
            description: None,
            safety: None,
            input_schema: None,
            handler: None,
        }
    }

    /// Unique capability name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Optional human-facing title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Description shown to callers.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared safety class.
    #[must_use]
    pub const fn safety(&self) -> Safety {
        self.safety
    }

    /// Input schema.
    #[must_use]
    pub fn input_schema(&self) -> &InputSchema {
        &self.input_schema
    }

    /// Annotations derived from title and safety.
    #[must_use]
    pub fn annotations(&self) -> Annotations {
        Annotations {
            title: self.title.clone(),
            read_only_hint: self.safety.is_read_only(),
        }
    }

    /// Name and description for listings.
    #[must_use]
    pub fn summary(&self) -> CapabilitySummary {
        CapabilitySummary {
            name: self.name.to_string(),
            description: self.description.clone(),
        }
    }

    /// Runs the handler.
    ///
    /// # Errors
    ///
    /// Propagates whatever [`CallError`](crate::CallError) the handler returns.
    pub async fn invoke(&self, ctx: CallContext, arguments: Value) -> CallOutcome {
        self.handler.call(ctx, arguments).await
    }
}

/// Builder for [`CapabilityDescriptor`].
pub struct CapabilityBuilder {
    name: String,
    title: Option<String>,
    description: Option<String>,
    safety: Option<Safety>,
    input_schema: Option<InputSchema>,
    handler: Option<Arc<dyn CapabilityHandler>>,
}

impl CapabilityBuilder {
    /// Sets the human-facing title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares the capability as [`Safety::ReadOnly`].
    #[must_use]
    pub fn read_only(self) -> Self {
        self.safety(Safety::ReadOnly)
    }

    /// Declares the capability as [`Safety::Mutating`].
    #[must_use]
    pub fn mutating(self) -> Self {
        self.safety(Safety::Mutating)
    }

    /// Declares the safety class explicitly.
    #[must_use]
    pub fn safety(mut self, safety: Safety) -> Self {
        self.safety = Some(safety);
        self
    }

    /// Sets the input schema. Defaults to an empty object schema.
    #[must_use]
    pub fn input_schema(mut self, schema: InputSchema) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Sets the handler.
    #[must_use]
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: CapabilityHandler + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sets an already shared handler.
    #[must_use]
    pub fn shared_handler(mut self, handler: Arc<dyn CapabilityHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Finalises the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapabilityName`] for a malformed name and
    /// [`Error::InvalidCapability`] when the description, safety class, or
    /// handler is missing or the title is too long.
    pub fn build(self) -> Result<CapabilityDescriptor> {
        let name = CapabilityName::new(self.name)?;

        let description = self
            .description
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| Error::InvalidCapability {
                reason: format!("{name}: description must be provided"),
            })?;

        let safety = self.safety.ok_or_else(|| Error::InvalidCapability {
            reason: format!("{name}: safety must be declared"),
        })?;

        let handler = self.handler.ok_or_else(|| Error::InvalidCapability {
            reason: format!("{name}: handler must be provided"),
        })?;

        if let Some(title) = &self.title
            && title.len() > MAX_TITLE_LEN
        {
            return Err(Error::InvalidCapability {
                reason: format!("{name}: title length must be <= {MAX_TITLE_LEN}"),
            });
        }

        Ok(CapabilityDescriptor {
            name,
            title: self.title,
            description,
            safety,
            input_schema: self.input_schema.unwrap_or_else(InputSchema::empty),
            handler,
        })
    }
}
