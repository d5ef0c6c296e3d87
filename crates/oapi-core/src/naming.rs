use crate::reflect::TypeDef;

/// Derives the component name a struct type is cached under.
pub trait NameStrategy {
    fn schema_name(&self, def: &TypeDef) -> String;
}

/// Names a type by its short name, prefixed with the last `segments`
/// module-path segments joined by `.` when `segments > 0`.
///
/// Generic arguments are folded into the name with `_`, so `Page<Pet, String>`
/// is cached as `Page_Pet_String`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModulePathNames {
    pub segments: usize,
}

impl ModulePathNames {
    pub fn new(segments: usize) -> Self {
        Self { segments }
    }
}

impl NameStrategy for ModulePathNames {
    fn schema_name(&self, def: &TypeDef) -> String {
        let name = component_key(&def.name);
        if self.segments == 0 || def.module_path.is_empty() {
            return name;
        }
        let parts: Vec<&str> = def.module_path.split("::").collect();
        let start = parts.len().saturating_sub(self.segments);
        format!("{}.{}", parts[start..].join("."), name)
    }
}

/// Replace every run of characters not allowed in a component key with one `_`.
fn component_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
            key.push(ch);
        } else if !key.ends_with('_') {
            key.push('_');
        }
    }
    key.trim_end_matches('_').to_string()
}

/// Whether a type name may be cached and referenced by name.
///
/// Names starting with a lowercase letter are always inlined.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| !c.is_lowercase())
}
