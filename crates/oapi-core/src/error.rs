use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::doc::HttpMethod;

/// Errors raised while converting a type into a schema.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("type {type_name:?} defines openapi types but returns none")]
    EmptySchemaTypes { type_name: String },

    #[error("type {type_name:?} uses unsupported map key type {key_type:?}")]
    UnsupportedMapKey { type_name: String, key_type: String },
}

/// The part of an operation being generated when synthesis failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parameters,
    RequestBody,
    Responses,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Parameters => "parameters",
            Stage::RequestBody => "request body",
            Stage::Responses => "responses",
        })
    }
}

/// Errors that abort a document build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("generating {stage} for {method} {path:?}: {source}")]
    Operation {
        stage: Stage,
        method: HttpMethod,
        path: String,
        #[source]
        source: SynthError,
    },
}

/// Errors while loading a spec configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
}
