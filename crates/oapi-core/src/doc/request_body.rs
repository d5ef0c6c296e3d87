use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::is_false;
use super::media_type::MediaType;

/// A request body definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub content: IndexMap<String, MediaType>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
}
