use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::components::Components;
use super::operation::{HttpMethod, Operation, PathItem};

/// The OpenAPI version every synthesized document declares.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// Info object describing the API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

/// Top-level OpenAPI 3.0 document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub openapi: String,

    pub info: Info,

    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    #[serde(default)]
    pub components: Components,
}

impl Document {
    pub fn new(info: Info) -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info,
            paths: IndexMap::new(),
            components: Components::default(),
        }
    }

    /// Attach `op` under `path` and `method`, creating the path item on demand.
    pub fn add_operation(&mut self, path: &str, method: HttpMethod, op: Operation) {
        self.paths
            .entry(path.to_string())
            .or_default()
            .set(method, op);
    }

    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.paths.get(path)?.get_operation(method)
    }
}
