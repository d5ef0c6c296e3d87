//! Capability-driven enrichment of freshly converted schemas.
//!
//! A type declares which capabilities it provides when it builds its
//! [`TypeDef`](crate::reflect::TypeDef):
//!
//! ```
//! use oapi_core::customize::{Attribute, Attributes, Capabilities, Docs};
//! use oapi_core::reflect::{FieldDef, Reflect, TypeDef};
//!
//! struct Pet;
//!
//! impl Docs for Pet {
//!     fn docs() -> &'static [(&'static str, &'static str)] {
//!         &[("name", "The pet's name.")]
//!     }
//! }
//!
//! impl Attributes for Pet {
//!     fn attributes() -> &'static [(&'static str, Attribute)] {
//!         &[("name", Attribute::Required)]
//!     }
//! }
//!
//! impl Reflect for Pet {
//!     fn type_def() -> TypeDef {
//!         TypeDef::structure::<Self>(vec![FieldDef::new::<String>("name")]).with_capabilities(
//!             Capabilities::new()
//!                 .with_docs::<Self>()
//!                 .with_attributes::<Self>(),
//!         )
//!     }
//! }
//! ```
//!
//! `Docs`, `Attributes` and `Formats` impls are usually generated by
//! `oapi-docgen` from `openapi:` doc-comment directives.

use std::fmt;

use crate::doc::{Schema, SchemaOrRef, SchemaType};
use crate::error::SynthError;
use crate::reflect::TypeDef;

/// Property key → string value, as emitted by the doc extraction tool.
pub type PropertyTable = &'static [(&'static str, &'static str)];

/// Per-property attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    ReadOnly,
    Required,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::ReadOnly => "readonly",
            Attribute::Required => "required",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type that replaces its own schema type and format.
pub trait SchemaTypeOverride {
    /// Only the first entry is used; an empty list is an error.
    fn openapi_schema_type() -> &'static [SchemaType];

    fn openapi_schema_format() -> Option<&'static str> {
        None
    }
}

/// A type whose schema is a union of primitive types.
pub trait OneOfTypes {
    fn openapi_one_of_types() -> &'static [SchemaType];
}

/// Property descriptions.
pub trait Docs {
    fn docs() -> PropertyTable;
}

/// Property attributes.
pub trait Attributes {
    fn attributes() -> &'static [(&'static str, Attribute)];
}

/// Property formats.
pub trait Formats {
    fn formats() -> PropertyTable;
}

#[derive(Debug, Clone, Copy)]
struct SchemaTypeFns {
    types: fn() -> &'static [SchemaType],
    format: fn() -> Option<&'static str>,
}

/// The set of customization capabilities a type registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    schema_type: Option<SchemaTypeFns>,
    one_of: Option<fn() -> &'static [SchemaType]>,
    docs: Option<fn() -> PropertyTable>,
    attributes: Option<fn() -> &'static [(&'static str, Attribute)]>,
    formats: Option<fn() -> PropertyTable>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema_type<T: SchemaTypeOverride + ?Sized>(mut self) -> Self {
        self.schema_type = Some(SchemaTypeFns {
            types: T::openapi_schema_type,
            format: T::openapi_schema_format,
        });
        self
    }

    pub fn with_one_of<T: OneOfTypes + ?Sized>(mut self) -> Self {
        self.one_of = Some(T::openapi_one_of_types);
        self
    }

    pub fn with_docs<T: Docs + ?Sized>(mut self) -> Self {
        self.docs = Some(T::docs);
        self
    }

    pub fn with_attributes<T: Attributes + ?Sized>(mut self) -> Self {
        self.attributes = Some(T::attributes);
        self
    }

    pub fn with_formats<T: Formats + ?Sized>(mut self) -> Self {
        self.formats = Some(T::formats);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.schema_type.is_none()
            && self.one_of.is_none()
            && self.docs.is_none()
            && self.attributes.is_none()
            && self.formats.is_none()
    }

    pub fn docs(&self) -> Option<PropertyTable> {
        self.docs.map(|docs| docs())
    }

    pub fn attributes(&self) -> Option<&'static [(&'static str, Attribute)]> {
        self.attributes.map(|attributes| attributes())
    }

    pub fn formats(&self) -> Option<PropertyTable> {
        self.formats.map(|formats| formats())
    }
}

/// Run the customizer chain for `def` over its freshly converted `schema`.
///
/// Order is fixed: type override, one-of types, docs, attributes, formats.
pub fn apply(def: &TypeDef, schema: &mut Schema) -> Result<(), SynthError> {
    let caps = &def.capabilities;

    if let Some(fns) = caps.schema_type {
        apply_type(&def.name, schema, (fns.types)(), (fns.format)())?;
    }
    if let Some(one_of) = caps.one_of {
        apply_one_of_types(schema, one_of());
    }
    if let Some(docs) = caps.docs() {
        apply_docs(schema, docs);
    }
    if let Some(attributes) = caps.attributes() {
        apply_attrs(schema, attributes);
    }
    if let Some(formats) = caps.formats() {
        apply_formats(schema, formats);
    }
    Ok(())
}

fn lookup<'t, V>(table: &'t [(&'static str, V)], key: &str) -> Option<&'t V> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
}

fn apply_type(
    name: &str,
    schema: &mut Schema,
    types: &[SchemaType],
    format: Option<&str>,
) -> Result<(), SynthError> {
    let Some(first) = types.first() else {
        return Err(SynthError::EmptySchemaTypes {
            type_name: name.to_string(),
        });
    };
    schema.schema_type = Some(*first);
    schema.format = format.map(str::to_string);
    Ok(())
}

fn apply_one_of_types(schema: &mut Schema, types: &[SchemaType]) {
    schema.one_of = types
        .iter()
        .map(|t| SchemaOrRef::inline(Schema::of_type(*t)))
        .collect();
}

fn apply_docs(schema: &mut Schema, docs: PropertyTable) {
    for (key, prop) in schema.properties.iter_mut() {
        let Some(doc) = lookup(docs, key) else {
            continue;
        };
        if let Some(prop) = prop.as_schema_mut() {
            prop.description = Some(doc.to_string());
        }
    }
}

fn apply_attrs(schema: &mut Schema, attributes: &[(&'static str, Attribute)]) {
    let mut required = Vec::new();
    for (key, prop) in schema.properties.iter_mut() {
        match lookup(attributes, key) {
            Some(Attribute::ReadOnly) => {
                if let Some(prop) = prop.as_schema_mut() {
                    prop.read_only = Some(true);
                }
            }
            Some(Attribute::Required) => required.push(key.clone()),
            None => {}
        }
    }
    if !required.is_empty() {
        required.sort();
        schema.required = required;
    }
}

fn apply_formats(schema: &mut Schema, formats: PropertyTable) {
    for (key, prop) in schema.properties.iter_mut() {
        let Some(format) = lookup(formats, key) else {
            continue;
        };
        if let Some(prop) = prop.as_schema_mut() {
            prop.format = Some(format.to_string());
        }
    }
}
