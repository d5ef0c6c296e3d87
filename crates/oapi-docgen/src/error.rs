use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocgenError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    #[error("no Rust source files found in {}", .0.display())]
    NoSources(PathBuf),

    #[error(
        "format directive on {struct_name}.{field} should be in form openapi:format=<format>, got {directive}"
    )]
    MalformedDirective {
        struct_name: String,
        field: String,
        directive: String,
    },

    #[error("failed to render output: {0}")]
    Template(#[from] minijinja::Error),
}
