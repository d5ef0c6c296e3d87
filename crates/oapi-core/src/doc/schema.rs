use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Prefix of every component schema reference.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// A primitive type keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference or inline schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Schema(Box<Schema>),
}

impl SchemaOrRef {
    /// A reference to the component schema registered under `name`.
    pub fn reference(name: &str) -> Self {
        SchemaOrRef::Ref {
            ref_path: format!("{SCHEMA_REF_PREFIX}{name}"),
        }
    }

    pub fn inline(schema: Schema) -> Self {
        SchemaOrRef::Schema(Box::new(schema))
    }

    /// The referenced component name, if this is a reference.
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            SchemaOrRef::Ref { ref_path } => ref_path.strip_prefix(SCHEMA_REF_PREFIX),
            SchemaOrRef::Schema(_) => None,
        }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaOrRef::Schema(schema) => Some(schema),
            SchemaOrRef::Ref { .. } => None,
        }
    }

    pub fn as_schema_mut(&mut self) -> Option<&mut Schema> {
        match self {
            SchemaOrRef::Schema(schema) => Some(schema),
            SchemaOrRef::Ref { .. } => None,
        }
    }
}

impl From<Schema> for SchemaOrRef {
    fn from(schema: Schema) -> Self {
        SchemaOrRef::inline(schema)
    }
}

/// A JSON Schema object (OpenAPI 3.0 subset).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    // Object properties
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaOrRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    // Array items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaOrRef>>,

    // Composition
    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaOrRef>,

    // Numeric constraints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    // Read/Write only
    #[serde(rename = "readOnly", skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

impl Schema {
    pub fn of_type(schema_type: SchemaType) -> Self {
        Schema {
            schema_type: Some(schema_type),
            ..Schema::default()
        }
    }

    /// Builder-style format setter.
    pub fn with_format(mut self, format: Option<&str>) -> Self {
        self.format = format.map(str::to_string);
        self
    }

    /// True when no keyword is set, i.e. the schema accepts anything.
    pub fn is_empty(&self) -> bool {
        *self == Schema::default()
    }
}

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaOrRef>),
}
