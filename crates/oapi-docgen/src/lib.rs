//! Extracts `openapi:` directives from struct doc comments and emits the
//! matching `oapi_core::customize` capability impls.
//!
//! Field docs become property descriptions. Directive lines are recognised
//! anywhere in a doc comment:
//!
//! ```text
//! /// openapi:gen
//! pub struct Pet {
//!     /// The pet's unique id.
//!     /// openapi:readonly
//!     pub id: u64,
//!     /// openapi:required
//!     /// openapi:format=email
//!     pub owner: String,
//! }
//! ```

pub mod emit;
pub mod error;
pub mod extract;

use std::path::Path;

pub use emit::emit;
pub use error::DocgenError;
pub use extract::{FieldAttribute, StructInfo, extract_dir};

/// Name of the generated file, written next to the scanned sources.
pub const OUTPUT_FILE_NAME: &str = "openapi_docs.rs";

/// Extraction options.
#[derive(Debug, Clone)]
pub struct DocgenOptions {
    /// Attribute consulted for renamed and skipped fields.
    pub tag: String,
    /// Include every struct, not only those marked `openapi:gen`.
    pub all: bool,
}

impl Default for DocgenOptions {
    fn default() -> Self {
        Self {
            tag: "serde".to_string(),
            all: false,
        }
    }
}

/// Generate the docs module for the Rust sources in `dir`.
///
/// Returns `None` when no struct has anything to document.
pub fn generate(dir: &Path, options: &DocgenOptions) -> Result<Option<String>, DocgenError> {
    let structs = extract_dir(dir, options)?;
    emit(&structs)
}
