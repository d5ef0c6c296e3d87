//! Query parameters derived from a struct's scalar fields.

use crate::doc::SchemaType;
use crate::op::Parameter;
use crate::reflect::{Reflect, TypeDef, TypeKind};

/// One query parameter per scalar field of `def`, in field order.
///
/// Optional scalars count as their inner type and string-keyed maps of
/// strings as strings; struct, array and untyped fields are skipped.
/// Descriptions come from the struct's property docs.
pub fn parse_params(def: &TypeDef) -> Vec<Parameter> {
    let TypeKind::Struct(fields) = &def.kind else {
        return Vec::new();
    };
    let docs = def.capabilities.docs().unwrap_or(&[]);
    fields
        .iter()
        .filter_map(|field| {
            let ty = scalar_type(&field.type_def())?;
            let description = docs
                .iter()
                .find(|(key, _)| *key == field.name)
                .map_or("", |(_, doc)| *doc);
            Some(Parameter::query_with_type(field.name.clone(), description, ty))
        })
        .collect()
}

pub fn parse_params_for<T: Reflect + ?Sized>() -> Vec<Parameter> {
    parse_params(&T::type_def())
}

fn scalar_type(def: &TypeDef) -> Option<SchemaType> {
    match &def.kind {
        TypeKind::Boolean => Some(SchemaType::Boolean),
        TypeKind::Integer { .. } => Some(SchemaType::Integer),
        TypeKind::Number { .. } => Some(SchemaType::Number),
        TypeKind::String { .. } => Some(SchemaType::String),
        TypeKind::Optional(inner) => scalar_type(&inner()),
        TypeKind::Map { key, value } => {
            let string = |def: TypeDef| matches!(def.kind, TypeKind::String { .. });
            (string(key()) && string(value())).then_some(SchemaType::String)
        }
        TypeKind::Any | TypeKind::Array(_) | TypeKind::Struct(_) => None,
    }
}
