//! OpenAPI 3.0 document synthesis from router metadata and reflected types.
//!
//! Operations are described with [`op()`](op::op) and attached to routes
//! either as a middleware ([`OpBuilder::build`](op::OpBuilder::build)) or
//! through an [`OperationRegistry`]. [`build_spec`] then walks a router and
//! produces a [`Document`](doc::Document), converting every referenced type
//! through its [`Reflect`] description.

pub mod config;
pub mod convert;
pub mod customize;
pub mod doc;
pub mod error;
pub mod naming;
pub mod op;
pub mod params;
pub mod reflect;
pub mod registry;
pub mod router;
pub mod spec;
pub mod synth;

pub use config::{SpecConfig, load_config};
pub use error::{BuildError, ConfigError, SynthError};
pub use op::{Middleware, Next, OpBuilder, Operation, Parameter, Response, Sample, Security, op};
pub use params::{parse_params, parse_params_for};
pub use reflect::{FieldDef, Reflect, TypeDef, TypeKind};
pub use registry::{HandlerId, HandlerIdentity, OperationRegistry};
pub use router::{RouteEntry, Router, Routes};
pub use spec::build_spec;
pub use synth::Generator;
