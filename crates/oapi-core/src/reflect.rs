//! Type descriptors standing in for runtime reflection.
//!
//! A type opts into schema synthesis by implementing [`Reflect`], returning a
//! [`TypeDef`] that describes its shape and the customization capabilities it
//! provides. Field types are stored as function pointers so recursive types
//! stay finite; the converter only expands them on demand.

use std::any::type_name;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use crate::customize::Capabilities;

/// Lazily produces the descriptor of a type.
pub type TypeFn = fn() -> TypeDef;

/// Implemented by every type that can appear in a generated document.
pub trait Reflect {
    fn type_def() -> TypeDef;
}

/// Structural description of a type.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Unqualified type name; generic arguments keep only their last path segment.
    pub name: String,
    /// `::`-separated module path the type lives in, empty for builtins.
    pub module_path: String,
    pub kind: TypeKind,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Boolean,
    Integer {
        format: Option<&'static str>,
        unsigned: bool,
    },
    Number {
        format: Option<&'static str>,
    },
    String {
        format: Option<&'static str>,
    },
    /// Accepts any value, e.g. `serde_json::Value`.
    Any,
    Optional(TypeFn),
    Array(TypeFn),
    Map {
        key: TypeFn,
        value: TypeFn,
    },
    Struct(Vec<FieldDef>),
}

/// A named struct field. `name` is the serialized property key.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeFn,
}

impl FieldDef {
    pub fn new<T: Reflect + ?Sized>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: T::type_def,
        }
    }

    pub fn type_def(&self) -> TypeDef {
        (self.ty)()
    }
}

impl TypeDef {
    /// Describe `T` with the given kind, deriving its name from `std::any::type_name`.
    pub fn of<T: ?Sized>(kind: TypeKind) -> Self {
        let (module_path, name) = split_type_name(type_name::<T>());
        Self {
            name,
            module_path,
            kind,
            capabilities: Capabilities::default(),
        }
    }

    /// Describe the struct `T` with the given fields.
    pub fn structure<T: ?Sized>(fields: Vec<FieldDef>) -> Self {
        Self::of::<T>(TypeKind::Struct(fields))
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Override the derived name, for descriptors produced ahead of time.
    pub fn named(mut self, module_path: impl Into<String>, name: impl Into<String>) -> Self {
        self.module_path = module_path.into();
        self.name = name.into();
        self
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    /// Module path and name, identifying the type across modules.
    pub fn qualified_name(&self) -> String {
        if self.module_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.module_path, self.name)
        }
    }

    /// Strip one level of `Option`.
    pub fn unwrap_optional(&self) -> TypeDef {
        match &self.kind {
            TypeKind::Optional(inner) => inner(),
            _ => self.clone(),
        }
    }
}

/// Split a `type_name` into its module path and its short name.
///
/// Generic arguments are kept but shortened: `a::Page<b::Item>` becomes
/// (`a`, `Page<Item>`).
pub fn split_type_name(full: &str) -> (String, String) {
    let base_end = full.find('<').unwrap_or(full.len());
    let (base, generics) = full.split_at(base_end);
    let (module_path, short) = match base.rsplit_once("::") {
        Some((module_path, short)) => (module_path, short),
        None => ("", base),
    };
    (
        module_path.to_string(),
        format!("{short}{}", shorten_paths(generics)),
    )
}

fn shorten_paths(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut token = String::new();
    for ch in s.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            token.push(ch);
        } else {
            out.push_str(last_segment(&token));
            token.clear();
            out.push(ch);
        }
    }
    out.push_str(last_segment(&token));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

macro_rules! reflect_primitive {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn type_def() -> TypeDef {
                    TypeDef::of::<$ty>($kind)
                }
            }
        )*
    };
}

reflect_primitive! {
    bool => TypeKind::Boolean,
    i8 => TypeKind::Integer { format: None, unsigned: false },
    i16 => TypeKind::Integer { format: None, unsigned: false },
    i32 => TypeKind::Integer { format: None, unsigned: false },
    i64 => TypeKind::Integer { format: Some("int64"), unsigned: false },
    isize => TypeKind::Integer { format: None, unsigned: false },
    u8 => TypeKind::Integer { format: None, unsigned: true },
    u16 => TypeKind::Integer { format: None, unsigned: true },
    u32 => TypeKind::Integer { format: None, unsigned: true },
    u64 => TypeKind::Integer { format: Some("int64"), unsigned: true },
    usize => TypeKind::Integer { format: None, unsigned: true },
    f32 => TypeKind::Number { format: Some("float") },
    f64 => TypeKind::Number { format: Some("double") },
    char => TypeKind::String { format: None },
    str => TypeKind::String { format: None },
    String => TypeKind::String { format: None },
    serde_json::Value => TypeKind::Any,
}

impl<T: Reflect + ?Sized> Reflect for &T {
    fn type_def() -> TypeDef {
        T::type_def()
    }
}

impl<T: Reflect + ?Sized> Reflect for Box<T> {
    fn type_def() -> TypeDef {
        T::type_def()
    }
}

impl<T: Reflect + ?Sized> Reflect for Arc<T> {
    fn type_def() -> TypeDef {
        T::type_def()
    }
}

impl<T: Reflect + ?Sized> Reflect for Rc<T> {
    fn type_def() -> TypeDef {
        T::type_def()
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_def() -> TypeDef {
        TypeDef::of::<Self>(TypeKind::Optional(T::type_def))
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_def() -> TypeDef {
        TypeDef::of::<Self>(TypeKind::Array(T::type_def))
    }
}

impl<T: Reflect> Reflect for [T] {
    fn type_def() -> TypeDef {
        TypeDef::of::<Self>(TypeKind::Array(T::type_def))
    }
}

impl<T: Reflect, S> Reflect for HashSet<T, S> {
    fn type_def() -> TypeDef {
        TypeDef::of::<Self>(TypeKind::Array(T::type_def))
    }
}

impl<T: Reflect> Reflect for BTreeSet<T> {
    fn type_def() -> TypeDef {
        TypeDef::of::<Self>(TypeKind::Array(T::type_def))
    }
}

impl<K: Reflect, V: Reflect, S> Reflect for HashMap<K, V, S> {
    fn type_def() -> TypeDef {
        TypeDef::of::<Self>(TypeKind::Map {
            key: K::type_def,
            value: V::type_def,
        })
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn type_def() -> TypeDef {
        TypeDef::of::<Self>(TypeKind::Map {
            key: K::type_def,
            value: V::type_def,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Reflect for Plain {
        fn type_def() -> TypeDef {
            TypeDef::structure::<Self>(vec![FieldDef::new::<String>("name")])
        }
    }

    #[test]
    fn test_split_plain_path() {
        let (module, name) = split_type_name("my_app::models::Pet");
        assert_eq!(module, "my_app::models");
        assert_eq!(name, "Pet");
    }

    #[test]
    fn test_split_generic_path() {
        let (module, name) =
            split_type_name("my_app::models::Page<my_app::models::Pet, alloc::string::String>");
        assert_eq!(module, "my_app::models");
        assert_eq!(name, "Page<Pet, String>");
    }

    #[test]
    fn test_split_builtin() {
        let (module, name) = split_type_name("bool");
        assert_eq!(module, "");
        assert_eq!(name, "bool");
    }

    #[test]
    fn test_struct_def_uses_type_name() {
        let def = Plain::type_def();
        assert_eq!(def.name, "Plain");
        assert!(def.module_path.ends_with("reflect::tests"));
        assert!(def.is_struct());
    }

    #[test]
    fn test_unwrap_optional_one_level() {
        let def = <Option<Plain>>::type_def().unwrap_optional();
        assert_eq!(def.name, "Plain");

        let nested = <Option<Option<Plain>>>::type_def().unwrap_optional();
        assert!(matches!(nested.kind, TypeKind::Optional(_)));
    }

    #[test]
    fn test_smart_pointers_are_transparent() {
        assert_eq!(<Box<Plain>>::type_def().name, "Plain");
        assert_eq!(<Arc<Plain>>::type_def().name, "Plain");
        assert!(matches!(<&str>::type_def().kind, TypeKind::String { .. }));
    }
}
