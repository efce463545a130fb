//! Structural input schemas for capabilities.
//!
//! Schemas are plain JSON Schema objects. This crate only builds and stores
//! them; validating arguments against them is the session layer's job.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::pagination::{DEFAULT_PER_PAGE, MAX_PER_PAGE, MIN_PAGE, MIN_PER_PAGE};

/// JSON Schema describing the arguments a capability accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputSchema(Value);

impl InputSchema {
    /// Schema for a capability that takes no arguments.
    #[must_use]
    pub fn empty() -> Self {
        SchemaBuilder::new().build()
    }

    /// Returns the raw JSON Schema document.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Returns the schema for a single named property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.0.get("properties")?.get(name)
    }

    /// Returns the names of all declared properties.
    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        self.0
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns `true` when the property is listed as required.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.0
            .get("required")
            .and_then(Value::as_array)
            .is_some_and(|required| required.iter().any(|v| v.as_str() == Some(name)))
    }

    /// Returns the enumerated values allowed for a property, if constrained.
    #[must_use]
    pub fn enum_values(&self, name: &str) -> Option<Vec<&str>> {
        let values = self.property(name)?.get("enum")?.as_array()?;
        Some(values.iter().filter_map(Value::as_str).collect())
    }
}

impl From<InputSchema> for Value {
    fn from(value: InputSchema) -> Self {
        value.0
    }
}

/// Schema fragment for one property.
#[derive(Clone, Debug, Default)]
pub struct Property(Map<String, Value>);

impl Property {
    fn typed(kind: &str, description: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("type".into(), Value::String(kind.into()));
        map.insert("description".into(), Value::String(description.into()));
        Self(map)
    }

    /// A string property.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self::typed("string", description)
    }

    /// A numeric property.
    #[must_use]
    pub fn number(description: impl Into<String>) -> Self {
        Self::typed("number", description)
    }

    /// A boolean property.
    #[must_use]
    pub fn boolean(description: impl Into<String>) -> Self {
        Self::typed("boolean", description)
    }

    /// An array-of-strings property.
    #[must_use]
    pub fn string_array(description: impl Into<String>) -> Self {
        let mut property = Self::typed("array", description);
        property.0.insert("items".into(), json!({ "type": "string" }));
        property
    }

    /// Restricts the property to the supplied values.
    #[must_use]
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|v| Value::String(v.into()))
            .collect();
        self.0.insert("enum".into(), Value::Array(values));
        self
    }

    /// Declares the default value advertised to callers.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.0.insert("default".into(), value);
        self
    }

    /// Sets an inclusive numeric minimum.
    #[must_use]
    pub fn minimum(mut self, min: i64) -> Self {
        self.0.insert("minimum".into(), Value::from(min));
        self
    }

    /// Sets an inclusive numeric maximum.
    #[must_use]
    pub fn maximum(mut self, max: i64) -> Self {
        self.0.insert("maximum".into(), Value::from(max));
        self
    }

    fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Builder for object-shaped [`InputSchema`] values.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl SchemaBuilder {
    /// Creates an empty object schema builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an optional property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.properties.insert(name.into(), property.into_value());
        self
    }

    /// Adds a property and marks it required.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>, property: Property) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), property.into_value());
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    /// Adds offset pagination (`page`, `perPage`).
    #[must_use]
    pub fn with_pagination(self) -> Self {
        self.property(
            "page",
            Property::number("Page number for pagination (min 1)").minimum(MIN_PAGE),
        )
        .property("perPage", per_page_property())
    }

    /// Adds offset and cursor pagination (`page`, `perPage`, `after`).
    #[must_use]
    pub fn with_unified_pagination(self) -> Self {
        self.with_pagination().property("after", after_property())
    }

    /// Adds cursor-only pagination (`perPage`, `after`).
    #[must_use]
    pub fn with_cursor_pagination(self) -> Self {
        self.property("perPage", per_page_property())
            .property("after", after_property())
    }

    /// Finalises the schema.
    #[must_use]
    pub fn build(self) -> InputSchema {
        InputSchema(json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required,
        }))
    }
}

fn per_page_property() -> Property {
    Property::number(format!(
        "Results per page for pagination (min {MIN_PER_PAGE}, max {MAX_PER_PAGE}, default {DEFAULT_PER_PAGE})"
    ))
    .minimum(MIN_PER_PAGE)
    .maximum(MAX_PER_PAGE)
}

fn after_property() -> Property {
    Property::string(
        "Cursor for pagination. Use the endCursor from the previous page's PageInfo.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_required_and_enum_constraints() {
        let schema = SchemaBuilder::new()
            .required("owner", Property::string("Repository owner"))
            .property(
                "state",
                Property::string("Filter by state").one_of(["open", "closed", "all"]),
            )
            .build();

        assert!(schema.is_required("owner"));
        assert!(!schema.is_required("state"));
        assert_eq!(
            schema.enum_values("state"),
            Some(vec!["open", "closed", "all"])
        );
        assert_eq!(schema.as_value()["type"], "object");
    }

    #[test]
    fn pagination_mixins_add_expected_fields() {
        let offset = SchemaBuilder::new().with_pagination().build();
        let mut names = offset.property_names();
        names.sort_unstable();
        assert_eq!(names, vec!["page", "perPage"]);
        assert_eq!(offset.property("perPage").unwrap()["maximum"], 100);

        let cursor = SchemaBuilder::new().with_cursor_pagination().build();
        assert!(cursor.property("page").is_none());
        assert!(cursor.property("after").is_some());

        let unified = SchemaBuilder::new().with_unified_pagination().build();
        assert_eq!(unified.property_names().len(), 3);
    }

    #[test]
    fn empty_schema_is_an_object() {
        let schema = InputSchema::empty();
        assert!(schema.property_names().is_empty());
        assert_eq!(schema.as_value()["required"], json!([]));
    }
}
