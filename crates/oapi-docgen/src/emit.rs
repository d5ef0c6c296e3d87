use std::collections::BTreeMap;

use minijinja::{AutoEscape, Environment, Value, context};

use crate::error::DocgenError;
use crate::extract::StructInfo;

const TEMPLATE_NAME: &str = "openapi_docs.rs.j2";

/// Render the docs module for `structs`. `None` when there is nothing to emit.
pub fn emit(structs: &[StructInfo]) -> Result<Option<String>, DocgenError> {
    let structs: Vec<&StructInfo> = structs.iter().filter(|s| !s.is_empty()).collect();
    if structs.is_empty() {
        return Ok(None);
    }

    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);
    env.add_template(
        TEMPLATE_NAME,
        include_str!("../templates/openapi_docs.rs.j2"),
    )?;
    let tmpl = env.get_template(TEMPLATE_NAME)?;

    let structs: Vec<Value> = structs.into_iter().map(struct_to_ctx).collect();
    let rendered = tmpl.render(context! {
        structs => structs,
    })?;
    Ok(Some(rendered))
}

fn struct_to_ctx(info: &StructInfo) -> Value {
    let attrs: Vec<Value> = info
        .attrs
        .iter()
        .map(|(key, attr)| {
            context! {
                key => literal(key),
                value => attr.variant(),
            }
        })
        .collect();

    context! {
        path => info.path.clone(),
        docs => entries(&info.docs),
        attrs => attrs,
        formats => entries(&info.formats),
    }
}

fn entries(map: &BTreeMap<String, String>) -> Vec<Value> {
    map.iter()
        .map(|(key, value)| {
            context! {
                key => literal(key),
                value => literal(value),
            }
        })
        .collect()
}

/// `s` as a Rust string literal.
fn literal(s: &str) -> String {
    format!("{s:?}")
}
