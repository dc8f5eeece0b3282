//! Schema descriptors built once at registration time.

use serde_json::{json, Map, Value};

use crate::types::{ParamDescriptor, ParamType, SchemaError, SchemaResult};

/// Ordered, immutable description of a tool's input parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDescriptor {
    params: Vec<ParamDescriptor>,
}

impl SchemaDescriptor {
    /// Start building a descriptor.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// A descriptor for a tool that takes no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Declared parameters in declaration order.
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ParamDescriptor> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Project the descriptor as an MCP `inputSchema` object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut prop = Map::new();
            prop.insert("type".to_string(), json!(param.param_type.as_str()));
            if let Some(description) = &param.description {
                prop.insert("description".to_string(), json!(description));
            }
            properties.insert(param.name.clone(), Value::Object(prop));
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));

        let required: Vec<&str> = self.required_names().collect();
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }

        Value::Object(schema)
    }
}

/// Builder for [`SchemaDescriptor`]. The first error encountered is
/// reported by [`SchemaBuilder::build`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    params: Vec<ParamDescriptor>,
    error: Option<SchemaError>,
}

impl SchemaBuilder {
    /// Declare a required parameter.
    pub fn required(self, name: impl Into<String>, param_type: ParamType) -> Self {
        self.push(name.into(), param_type, true)
    }

    /// Declare an optional parameter.
    pub fn optional(self, name: impl Into<String>, param_type: ParamType) -> Self {
        self.push(name.into(), param_type, false)
    }

    /// Attach a description to an already declared parameter.
    pub fn describe(mut self, name: &str, description: impl Into<String>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(param) => param.description = Some(description.into()),
            None => self.error = Some(SchemaError::UnknownParam(name.to_string())),
        }
        self
    }

    pub fn build(self) -> SchemaResult<SchemaDescriptor> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(SchemaDescriptor {
                params: self.params,
            }),
        }
    }

    fn push(mut self, name: String, param_type: ParamType, required: bool) -> Self {
        if self.error.is_some() {
            return self;
        }
        if name.trim().is_empty() {
            self.error = Some(SchemaError::EmptyName);
        } else if self.params.iter().any(|p| p.name == name) {
            self.error = Some(SchemaError::DuplicateParam(name));
        } else {
            self.params.push(ParamDescriptor {
                name,
                param_type,
                required,
                description: None,
            });
        }
        self
    }
}

/// A typed tool input that declares its own schema.
///
/// Implemented by the argument struct of a typed tool; the arguments are
/// validated against `schema()` and then deserialized into `Self`.
pub trait ToolInput {
    fn schema() -> SchemaResult<SchemaDescriptor>;
}
