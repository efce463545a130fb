//! A named group of capabilities.

use std::sync::Arc;

use toolset_primitives::{CapabilityDescriptor, Safety};

use crate::{ToolsetError, ToolsetResult};

/// Named, independently enableable group of capabilities.
///
/// Toolsets start disabled. Read and mutating capabilities are kept apart so
/// that read-only lockdown can drop every mutating capability at once.
#[derive(Clone, Debug)]
pub struct Toolset {
    name: String,
    description: String,
    enabled: bool,
    read_only: bool,
    read_capabilities: Vec<Arc<CapabilityDescriptor>>,
    mutating_capabilities: Vec<Arc<CapabilityDescriptor>>,
}

impl Toolset {
    /// Creates an empty, disabled toolset.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            enabled: false,
            read_only: false,
            read_capabilities: Vec::new(),
            mutating_capabilities: Vec::new(),
        }
    }

    /// Toolset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the toolset's own flag is set.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether mutating capabilities are suppressed.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub(crate) fn set_enabled(&mut self) {
        self.enabled = true;
    }

    /// Suppresses every mutating capability, including ones already added.
    /// Further mutating additions are absorbed.
    pub fn set_read_only(&mut self) {
        self.read_only = true;
    }

    /// Consuming form of [`Toolset::set_read_only`].
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.set_read_only();
        self
    }

    /// Appends read-only capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`ToolsetError::ContractViolation`] if any capability declares
    /// [`Safety::Mutating`]. Nothing is appended in that case.
    pub fn add_read_capabilities<I>(mut self, capabilities: I) -> ToolsetResult<Self>
    where
        I: IntoIterator<Item = CapabilityDescriptor>,
    {
        let capabilities = self.checked(capabilities, Safety::ReadOnly)?;
        self.read_capabilities.extend(capabilities);
        Ok(self)
    }

    /// Appends mutating capabilities. Under lockdown they are silently
    /// dropped after the safety check.
    ///
    /// # Errors
    ///
    /// Returns [`ToolsetError::ContractViolation`] if any capability declares
    /// [`Safety::ReadOnly`]. Nothing is appended in that case.
    pub fn add_mutating_capabilities<I>(mut self, capabilities: I) -> ToolsetResult<Self>
    where
        I: IntoIterator<Item = CapabilityDescriptor>,
    {
        let capabilities = self.checked(capabilities, Safety::Mutating)?;
        if !self.read_only {
            self.mutating_capabilities.extend(capabilities);
        }
        Ok(self)
    }

    fn checked<I>(
        &self,
        capabilities: I,
        expected: Safety,
    ) -> ToolsetResult<Vec<Arc<CapabilityDescriptor>>>
    where
        I: IntoIterator<Item = CapabilityDescriptor>,
    {
        capabilities
            .into_iter()
            .map(|capability| {
                if capability.safety() == expected {
                    Ok(Arc::new(capability))
                } else {
                    Err(ToolsetError::ContractViolation {
                        toolset: self.name.clone(),
                        capability: capability.name().to_owned(),
                        declared: capability.safety(),
                        expected,
                    })
                }
            })
            .collect()
    }

    /// Capabilities currently exposable: empty while disabled.
    #[must_use]
    pub fn active_capabilities(&self) -> Vec<Arc<CapabilityDescriptor>> {
        if !self.enabled {
            return Vec::new();
        }
        self.available_capabilities()
    }

    /// Capabilities that enabling would expose, honoring lockdown.
    #[must_use]
    pub fn available_capabilities(&self) -> Vec<Arc<CapabilityDescriptor>> {
        let mut capabilities = self.read_capabilities.clone();
        if !self.read_only {
            capabilities.extend(self.mutating_capabilities.iter().cloned());
        }
        capabilities
    }

    /// Names of every stored capability, regardless of lockdown.
    pub fn capability_names(&self) -> impl Iterator<Item = &str> {
        self.read_capabilities
            .iter()
            .chain(&self.mutating_capabilities)
            .map(|capability| capability.name())
    }
}
