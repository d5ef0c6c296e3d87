use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use log::{debug, trace};
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, ExprLit, Fields, Item, ItemStruct, Lit, LitStr, Meta, Token};

use crate::DocgenOptions;
use crate::error::DocgenError;

const DIRECTIVE_PREFIX: &str = "openapi:";
const DIRECTIVE_GEN: &str = "gen";
const DIRECTIVE_READONLY: &str = "readonly";
const DIRECTIVE_REQUIRED: &str = "required";
const DIRECTIVE_FORMAT: &str = "format";

/// Per-property attribute, named after its `Attribute` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAttribute {
    ReadOnly,
    Required,
}

impl FieldAttribute {
    pub fn variant(&self) -> &'static str {
        match self {
            FieldAttribute::ReadOnly => "ReadOnly",
            FieldAttribute::Required => "Required",
        }
    }
}

/// Everything extracted from one struct, keyed by property name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructInfo {
    pub name: String,
    /// Path to the struct from the generated module, e.g. `super::pets::Pet`.
    pub path: String,
    pub docs: BTreeMap<String, String>,
    pub attrs: BTreeMap<String, FieldAttribute>,
    pub formats: BTreeMap<String, String>,
}

impl StructInfo {
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty() && self.attrs.is_empty() && self.formats.is_empty()
    }
}

/// Extract every documented struct from the `*.rs` files directly in `dir`,
/// sorted by name.
pub fn extract_dir(dir: &Path, options: &DocgenOptions) -> Result<Vec<StructInfo>, DocgenError> {
    let files = source_files(dir)?;
    if files.is_empty() {
        return Err(DocgenError::NoSources(dir.to_path_buf()));
    }

    let mut structs = Vec::new();
    for path in files {
        let content = fs::read_to_string(&path).map_err(|source| DocgenError::Io {
            path: path.clone(),
            source,
        })?;
        let file = syn::parse_file(&content).map_err(|source| DocgenError::Parse {
            path: path.clone(),
            source,
        })?;
        let module = module_name(&path);
        debug!("scanning {}", path.display());
        structs.extend(extract_items(&file.items, module.as_deref(), options)?);
    }

    structs.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    Ok(structs)
}

fn source_files(dir: &Path) -> Result<Vec<PathBuf>, DocgenError> {
    let io_err = |source: std::io::Error| DocgenError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_source_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_source_file(path: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some("rs") {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name != "tests.rs"
        && name != crate::OUTPUT_FILE_NAME
        && !name.ends_with("_test.rs")
        && !name.ends_with("_tests.rs")
}

/// Module a file defines relative to its directory; `None` for module roots.
fn module_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    match stem {
        "mod" | "lib" | "main" => None,
        _ => Some(stem.to_string()),
    }
}

/// Extract documented structs from top-level items.
pub fn extract_items(
    items: &[Item],
    module: Option<&str>,
    options: &DocgenOptions,
) -> Result<Vec<StructInfo>, DocgenError> {
    let mut structs = Vec::new();
    for item in items {
        let Item::Struct(item) = item else {
            continue;
        };
        if !item.generics.params.is_empty() {
            trace!("skipping generic struct {}", item.ident);
            continue;
        }
        if !options.all && !directives(&doc_lines(&item.attrs)).contains(&DIRECTIVE_GEN) {
            continue;
        }
        let info = extract_struct(item, module, &options.tag)?;
        if info.is_empty() {
            trace!("nothing to document on {}", item.ident);
            continue;
        }
        structs.push(info);
    }
    Ok(structs)
}

fn extract_struct(
    item: &ItemStruct,
    module: Option<&str>,
    tag: &str,
) -> Result<StructInfo, DocgenError> {
    let name = item.ident.unraw().to_string();
    let path = match module {
        Some(module) => format!("super::{module}::{name}"),
        None => format!("super::{name}"),
    };
    let mut info = StructInfo {
        name,
        path,
        docs: BTreeMap::new(),
        attrs: BTreeMap::new(),
        formats: BTreeMap::new(),
    };

    let Fields::Named(fields) = &item.fields else {
        return Ok(info);
    };
    let rename_all = container_rename_all(&item.attrs, tag);

    for field in &fields.named {
        let lines = doc_lines(&field.attrs);
        if lines.is_empty() {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };
        let Some(key) = field_key(&ident.unraw().to_string(), &field.attrs, tag, rename_all.as_deref())
        else {
            continue;
        };

        let docs = doc_text(&lines);
        if !docs.is_empty() {
            info.docs.insert(key.clone(), docs);
        }

        for directive in directives(&lines) {
            if directive == DIRECTIVE_READONLY {
                info.attrs.insert(key.clone(), FieldAttribute::ReadOnly);
            } else if directive == DIRECTIVE_REQUIRED {
                info.attrs.entry(key.clone()).or_insert(FieldAttribute::Required);
            } else if directive.starts_with(DIRECTIVE_FORMAT) {
                let Some((_, format)) = directive.split_once('=') else {
                    return Err(DocgenError::MalformedDirective {
                        struct_name: info.name.clone(),
                        field: key,
                        directive: directive.to_string(),
                    });
                };
                info.formats.insert(key.clone(), format.to_string());
            }
        }
    }
    Ok(info)
}

/// Doc comment lines of `attrs`, one entry per source line.
fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .flat_map(|doc| doc.lines().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

/// Directives in `lines`, each cut at its first whitespace.
fn directives(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .filter_map(|line| line.trim().strip_prefix(DIRECTIVE_PREFIX))
        .filter_map(|rest| rest.split_whitespace().next())
        .collect()
}

/// Non-directive doc text joined into one line.
fn doc_text(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with(DIRECTIVE_PREFIX))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serialized property name of a field, or `None` when the field is skipped.
fn field_key(ident: &str, attrs: &[Attribute], tag: &str, rename_all: Option<&str>) -> Option<String> {
    let mut rename = None;
    let mut skip = false;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident(tag)) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if let Some(name) = serialize_name(&meta)? {
                    rename = Some(name);
                }
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                skip = true;
            } else {
                skip_value(&meta)?;
            }
            Ok(())
        });
        if let Err(err) = parsed {
            debug!("ignoring field {ident}: unreadable #[{tag}] attribute: {err}");
            return None;
        }
    }
    if skip {
        return None;
    }
    Some(match (rename, rename_all) {
        (Some(name), _) => name,
        (None, Some(rule)) => apply_rename_rule(ident, rule),
        (None, None) => ident.to_string(),
    })
}

fn container_rename_all(attrs: &[Attribute], tag: &str) -> Option<String> {
    let mut rename_all = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident(tag)) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                if let Some(rule) = serialize_name(&meta)? {
                    rename_all = Some(rule);
                }
            } else {
                skip_value(&meta)?;
            }
            Ok(())
        });
        if let Err(err) = parsed {
            debug!("ignoring unreadable #[{tag}] container attribute: {err}");
        }
    }
    rename_all
}

/// Value of `key = "..."` or the `serialize` entry of `key(serialize = "...")`.
fn serialize_name(meta: &ParseNestedMeta<'_>) -> syn::Result<Option<String>> {
    if meta.input.peek(Token![=]) {
        let value: LitStr = meta.value()?.parse()?;
        return Ok(Some(value.value()));
    }
    let mut name = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            let value: LitStr = inner.value()?.parse()?;
            name = Some(value.value());
        } else {
            skip_value(&inner)?;
        }
        Ok(())
    })?;
    Ok(name)
}

fn skip_value(meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_value(&inner))?;
    }
    Ok(())
}

fn apply_rename_rule(ident: &str, rule: &str) -> String {
    match rule {
        "lowercase" => ident.to_lowercase(),
        "UPPERCASE" => ident.to_uppercase(),
        "PascalCase" => ident.to_upper_camel_case(),
        "camelCase" => ident.to_lower_camel_case(),
        "snake_case" => ident.to_snake_case(),
        "SCREAMING_SNAKE_CASE" => ident.to_shouty_snake_case(),
        "kebab-case" => ident.to_kebab_case(),
        "SCREAMING-KEBAB-CASE" => ident.to_shouty_kebab_case(),
        _ => {
            debug!("unknown rename rule {rule:?}, keeping {ident}");
            ident.to_string()
        }
    }
}
