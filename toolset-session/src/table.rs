//! Name-keyed invocation table owned by one session.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use jsonschema::Validator;
use serde_json::Value;
use toolset_primitives::CapabilityDescriptor;
use tracing::warn;

/// Descriptor bound into a session together with its compiled schema.
#[derive(Clone)]
pub struct BoundCapability {
    descriptor: Arc<CapabilityDescriptor>,
    validator: Option<Arc<Validator>>,
}

impl BoundCapability {
    fn compile(descriptor: Arc<CapabilityDescriptor>) -> Self {
        let validator = match Validator::new(descriptor.input_schema().as_value()) {
            Ok(validator) => Some(Arc::new(validator)),
            Err(err) => {
                warn!(
                    capability = descriptor.name(),
                    error = %err,
                    "input schema does not compile; arguments will not be validated"
                );
                None
            }
        };
        Self {
            descriptor,
            validator,
        }
    }

    /// Returns the bound descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &Arc<CapabilityDescriptor> {
        &self.descriptor
    }

    /// Checks `arguments` against the input schema.
    ///
    /// # Errors
    ///
    /// Returns every schema violation joined into one message.
    pub fn validate(&self, arguments: &Value) -> Result<(), String> {
        let Some(validator) = &self.validator else {
            return Ok(());
        };
        if validator.is_valid(arguments) {
            return Ok(());
        }
        let errors: Vec<String> = validator
            .iter_errors(arguments)
            .map(|err| {
                let path = err.instance_path.to_string();
                if path.is_empty() {
                    err.to_string()
                } else {
                    format!("{path}: {err}")
                }
            })
            .collect();
        Err(errors.join("; "))
    }
}

/// Concurrent map from capability name to bound capability.
///
/// Entries are only ever added. Inserting a name that is already bound keeps
/// the existing entry.
#[derive(Default)]
pub struct InvocationTable {
    inner: RwLock<HashMap<String, BoundCapability>>,
}

impl fmt::Debug for InvocationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read().expect("invocation table poisoned");
        let mut names: Vec<_> = inner.keys().cloned().collect();
        names.sort();
        f.debug_struct("InvocationTable")
            .field("bound", &names)
            .finish()
    }
}

impl InvocationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a capability unless its name is already present. Returns `true`
    /// when the capability was newly bound.
    ///
    /// # Panics
    ///
    /// Panics if the internal table lock is poisoned.
    pub fn insert_if_absent(&self, descriptor: Arc<CapabilityDescriptor>) -> bool {
        let mut inner = self.inner.write().expect("invocation table poisoned");
        if inner.contains_key(descriptor.name()) {
            return false;
        }
        let name = descriptor.name().to_owned();
        inner.insert(name, BoundCapability::compile(descriptor));
        true
    }

    /// Returns the capability bound under `name`.
    ///
    /// # Panics
    ///
    /// Panics if the internal table lock is poisoned.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<BoundCapability> {
        let inner = self.inner.read().expect("invocation table poisoned");
        inner.get(name).cloned()
    }

    /// Whether `name` is bound.
    ///
    /// # Panics
    ///
    /// Panics if the internal table lock is poisoned.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .read()
            .expect("invocation table poisoned")
            .contains_key(name)
    }

    /// Number of bound capabilities.
    ///
    /// # Panics
    ///
    /// Panics if the internal table lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().expect("invocation table poisoned").len()
    }

    /// Whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every bound descriptor, sorted by name.
    ///
    /// # Panics
    ///
    /// Panics if the internal table lock is poisoned.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<CapabilityDescriptor>> {
        let inner = self.inner.read().expect("invocation table poisoned");
        let mut descriptors: Vec<_> = inner
            .values()
            .map(|bound| Arc::clone(&bound.descriptor))
            .collect();
        descriptors.sort_by(|a, b| a.name().cmp(b.name()));
        descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use toolset_primitives::{
        CallContext, CallError, CallResult, Property, SchemaBuilder,
    };

    fn descriptor(name: &str) -> Arc<CapabilityDescriptor> {
        Arc::new(
            CapabilityDescriptor::builder(name)
                .description("echo the owner")
                .read_only()
                .input_schema(
                    SchemaBuilder::new()
                        .required("owner", Property::string("Repository owner"))
                        .build(),
                )
                .handler(|_ctx: CallContext, args: Value| async move {
                    Ok::<_, CallError>(CallResult::success(args.to_string()))
                })
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn insert_is_idempotent_per_name() {
        let table = InvocationTable::new();
        assert!(table.is_empty());
        assert!(table.insert_if_absent(descriptor("get_me")));
        assert!(!table.insert_if_absent(descriptor("get_me")));
        assert_eq!(table.len(), 1);
        assert!(table.contains("get_me"));
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn list_is_sorted() {
        let table = InvocationTable::new();
        table.insert_if_absent(descriptor("b_tool"));
        table.insert_if_absent(descriptor("a_tool"));
        let names: Vec<_> = table.list().iter().map(|d| d.name().to_owned()).collect();
        assert_eq!(names, vec!["a_tool", "b_tool"]);
    }

    #[test]
    fn bound_capability_validates_arguments() {
        let table = InvocationTable::new();
        table.insert_if_absent(descriptor("get_me"));
        let bound = table.get("get_me").unwrap();

        assert!(bound.validate(&json!({ "owner": "octo" })).is_ok());
        assert!(bound.validate(&json!({})).unwrap_err().contains("owner"));
        assert!(bound.validate(&json!({ "owner": 7 })).is_err());
    }
}
