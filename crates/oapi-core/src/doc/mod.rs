//! The emitted OpenAPI 3.0 object graph.
//!
//! Serialization is left to the caller; every type here derives serde's
//! `Serialize` and `Deserialize` and skips unset keywords.

pub mod components;
pub mod document;
pub mod media_type;
pub mod operation;
pub mod parameter;
pub mod request_body;
pub mod response;
pub mod schema;
pub mod security;

pub use components::Components;
pub use document::{Document, Info, OPENAPI_VERSION};
pub use media_type::MediaType;
pub use operation::{HttpMethod, Operation, PathItem};
pub use parameter::{Parameter, ParameterLocation};
pub use request_body::RequestBody;
pub use response::{Header, Response};
pub use schema::{AdditionalProperties, Schema, SchemaOrRef, SchemaType};
pub use security::{ApiKeyLocation, SecurityRequirement, SecurityScheme, SecuritySchemeType};

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
