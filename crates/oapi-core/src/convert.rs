//! The value→schema converter the synthesizer delegates to.

use log::trace;

use crate::doc::{AdditionalProperties, Schema, SchemaOrRef, SchemaType};
use crate::error::SynthError;
use crate::naming::{NameStrategy, is_exported};
use crate::reflect::{TypeDef, TypeKind};

/// Per-type hook run on every freshly converted schema.
pub type SchemaHook = fn(&TypeDef, &mut Schema) -> Result<(), SynthError>;

/// What a converter may consult while converting.
pub struct ConvertContext<'a> {
    pub names: &'a dyn NameStrategy,
    pub hook: SchemaHook,
}

/// Turns a type descriptor into a schema.
pub trait Converter {
    fn convert(
        &mut self,
        def: &TypeDef,
        cx: &ConvertContext<'_>,
    ) -> Result<SchemaOrRef, SynthError>;

    /// Struct types referenced by name during the last conversion. The caller must
    /// add each of them as a component for the references to resolve.
    fn take_references(&mut self) -> Vec<TypeDef> {
        Vec::new()
    }
}

/// Default converter. Nested structs are inlined; re-entering a struct that is
/// still being converted yields a reference to its derived name.
///
/// Types that are not exported cannot be referenced, so re-entering one
/// yields a bare object schema instead.
#[derive(Debug, Default)]
pub struct ReflectConverter {
    visiting: Vec<String>,
    references: Vec<TypeDef>,
}

impl ReflectConverter {
    pub fn new() -> Self {
        Self::default()
    }

    fn convert_type(
        &mut self,
        def: &TypeDef,
        cx: &ConvertContext<'_>,
    ) -> Result<SchemaOrRef, SynthError> {
        let mut schema = match &def.kind {
            TypeKind::Boolean => Schema::of_type(SchemaType::Boolean),
            TypeKind::Integer { format, unsigned } => {
                let mut schema = Schema::of_type(SchemaType::Integer).with_format(*format);
                if *unsigned {
                    schema.minimum = Some(0.0);
                }
                schema
            }
            TypeKind::Number { format } => Schema::of_type(SchemaType::Number).with_format(*format),
            TypeKind::String { format } => Schema::of_type(SchemaType::String).with_format(*format),
            TypeKind::Any => Schema::default(),
            TypeKind::Optional(inner) => {
                return Ok(match self.convert_type(&inner(), cx)? {
                    SchemaOrRef::Schema(mut schema) => {
                        if !schema.is_empty() {
                            schema.nullable = Some(true);
                        }
                        SchemaOrRef::Schema(schema)
                    }
                    reference => reference,
                });
            }
            TypeKind::Array(items) => Schema {
                schema_type: Some(SchemaType::Array),
                items: Some(Box::new(self.convert_type(&items(), cx)?)),
                ..Schema::default()
            },
            TypeKind::Map { key, value } => {
                let key = key();
                if !matches!(key.kind, TypeKind::String { .. }) {
                    return Err(SynthError::UnsupportedMapKey {
                        type_name: def.name.clone(),
                        key_type: key.name,
                    });
                }
                let values = self.convert_type(&value(), cx)?;
                Schema {
                    schema_type: Some(SchemaType::Object),
                    additional_properties: Some(AdditionalProperties::Schema(Box::new(values))),
                    ..Schema::default()
                }
            }
            TypeKind::Struct(fields) => {
                let identity = def.qualified_name();
                if self.visiting.contains(&identity) {
                    if !is_exported(&def.name) {
                        trace!("truncating recursion into {identity}");
                        return Ok(SchemaOrRef::inline(Schema::of_type(SchemaType::Object)));
                    }
                    trace!("recursive reference to {identity}");
                    if !self
                        .references
                        .iter()
                        .any(|seen| seen.qualified_name() == identity)
                    {
                        self.references.push(def.clone());
                    }
                    return Ok(SchemaOrRef::reference(&cx.names.schema_name(def)));
                }
                self.visiting.push(identity);
                let mut schema = Schema::of_type(SchemaType::Object);
                for field in fields {
                    let prop = self.convert_type(&field.type_def(), cx)?;
                    schema.properties.insert(field.name.clone(), prop);
                }
                self.visiting.pop();
                schema
            }
        };
        (cx.hook)(def, &mut schema)?;
        Ok(SchemaOrRef::inline(schema))
    }
}

impl Converter for ReflectConverter {
    fn convert(
        &mut self,
        def: &TypeDef,
        cx: &ConvertContext<'_>,
    ) -> Result<SchemaOrRef, SynthError> {
        self.visiting.clear();
        self.references.clear();
        self.convert_type(def, cx)
    }

    fn take_references(&mut self) -> Vec<TypeDef> {
        std::mem::take(&mut self.references)
    }
}
