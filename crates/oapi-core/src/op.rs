//! Operation metadata and the builder that attaches it to routes.
//!
//! Metadata reaches the document through one of two channels: a sentinel
//! middleware produced by [`OpBuilder::build`], or an entry in an
//! [`OperationRegistry`] produced by [`OpBuilder::build_handler`].

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::doc::{ApiKeyLocation, ParameterLocation, SchemaType, SecurityScheme, SecuritySchemeType};
use crate::reflect::{Reflect, TypeDef, TypeFn};
use crate::registry::{HandlerIdentity, OperationRegistry};

/// What flows through a middleware chain.
///
/// Real requests carry a [`Next::Handler`]; the document builder probes each
/// middleware with [`Next::Sentinel`] and collects any [`Next::Operation`]
/// it answers with.
pub enum Next<H> {
    Handler(H),
    Operation(Operation),
    Sentinel,
}

impl<H> fmt::Debug for Next<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Next::Handler(_) => f.write_str("Handler(..)"),
            Next::Operation(op) => f.debug_tuple("Operation").field(op).finish(),
            Next::Sentinel => f.write_str("Sentinel"),
        }
    }
}

/// A handler-wrapping middleware.
pub type Middleware<H> = Arc<dyn Fn(Next<H>) -> Next<H> + Send + Sync>;

/// A value whose type is introspected; the value itself is discarded.
#[derive(Clone, Copy)]
pub struct Sample(TypeFn);

impl Sample {
    pub fn of<T: Reflect + ?Sized>() -> Self {
        Sample(T::type_def)
    }

    pub fn of_val<T: Reflect + ?Sized>(_value: &T) -> Self {
        Self::of::<T>()
    }

    pub fn type_def(&self) -> TypeDef {
        (self.0)()
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sample").field(&self.type_def().name).finish()
    }
}

/// How a parameter's schema is derived.
#[derive(Debug, Clone, Copy)]
pub enum ParamType {
    Primitive(SchemaType),
    Sample(Sample),
}

/// A declared operation parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    location: ParameterLocation,
    name: String,
    description: String,
    required: bool,
    ty: ParamType,
}

impl Parameter {
    /// A path parameter. Always required, typed `string`.
    pub fn path(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            location: ParameterLocation::Path,
            name: name.into(),
            description: description.into(),
            required: true,
            ty: ParamType::Primitive(SchemaType::String),
        }
    }

    /// A query parameter typed after `sample`.
    pub fn query(name: impl Into<String>, description: impl Into<String>, sample: Sample) -> Self {
        Self {
            location: ParameterLocation::Query,
            name: name.into(),
            description: description.into(),
            required: false,
            ty: ParamType::Sample(sample),
        }
    }

    /// A query parameter with an explicit primitive type.
    pub fn query_with_type(
        name: impl Into<String>,
        description: impl Into<String>,
        ty: SchemaType,
    ) -> Self {
        Self {
            location: ParameterLocation::Query,
            name: name.into(),
            description: description.into(),
            required: false,
            ty: ParamType::Primitive(ty),
        }
    }

    /// A string header parameter.
    pub fn header(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            location: ParameterLocation::Header,
            name: name.into(),
            description: description.into(),
            required: false,
            ty: ParamType::Primitive(SchemaType::String),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn location(&self) -> ParameterLocation {
        self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn ty(&self) -> ParamType {
        self.ty
    }
}

/// A declared response.
#[derive(Debug, Clone)]
pub struct Response {
    code: u16,
    description: String,
    writes: Option<Sample>,
    headers: Vec<String>,
    media_types: Option<Vec<String>>,
}

impl Response {
    pub fn new(code: u16, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            writes: None,
            headers: Vec::new(),
            media_types: None,
        }
    }

    /// Payload type of the response body.
    pub fn writes(mut self, sample: Sample) -> Self {
        self.writes = Some(sample);
        self
    }

    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.headers.push(name.into());
        self
    }

    /// Media types for this response only, overriding the operation's.
    pub fn media_types<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media_types = Some(media_types.into_iter().map(Into::into).collect());
        self
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn payload(&self) -> Option<Sample> {
        self.writes
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn media_type_override(&self) -> Option<&[String]> {
        self.media_types.as_deref()
    }
}

/// A security scheme an operation requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Security {
    #[serde(rename = "basic")]
    Basic,

    #[serde(rename = "bearer")]
    Bearer {
        #[serde(
            rename = "bearerFormat",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        bearer_format: Option<String>,
    },

    #[serde(rename = "apiKey")]
    ApiKey {
        name: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
}

impl Security {
    pub fn bearer() -> Self {
        Security::Bearer {
            bearer_format: None,
        }
    }

    pub fn bearer_with_format(format: impl Into<String>) -> Self {
        Security::Bearer {
            bearer_format: Some(format.into()),
        }
    }

    pub fn api_key(name: impl Into<String>, location: ApiKeyLocation) -> Self {
        Security::ApiKey {
            name: name.into(),
            location,
        }
    }

    /// The `components.securitySchemes` entry for this scheme.
    pub fn to_scheme(&self) -> SecurityScheme {
        match self {
            Security::Basic => SecurityScheme {
                scheme_type: SecuritySchemeType::Http,
                name: None,
                location: None,
                scheme: Some("basic".to_string()),
                bearer_format: None,
            },
            Security::Bearer { bearer_format } => SecurityScheme {
                scheme_type: SecuritySchemeType::Http,
                name: None,
                location: None,
                scheme: Some("bearer".to_string()),
                bearer_format: bearer_format.clone(),
            },
            Security::ApiKey { name, location } => SecurityScheme {
                scheme_type: SecuritySchemeType::ApiKey,
                name: Some(name.clone()),
                location: Some(*location),
                scheme: None,
                bearer_format: None,
            },
        }
    }
}

/// Metadata describing one API operation.
#[derive(Debug, Clone, Default)]
pub struct Operation {
    id: String,
    summary: String,
    tags: Vec<String>,
    params: Vec<Parameter>,
    consumes: Vec<String>,
    reads: Option<Sample>,
    produces: Vec<String>,
    returns: Vec<Response>,
    security: IndexMap<String, Security>,
}

impl Operation {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn consumes(&self) -> &[String] {
        &self.consumes
    }

    pub fn reads(&self) -> Option<Sample> {
        self.reads
    }

    pub fn produces(&self) -> &[String] {
        &self.produces
    }

    pub fn returns(&self) -> &[Response] {
        &self.returns
    }

    pub fn security(&self) -> &IndexMap<String, Security> {
        &self.security
    }

    /// Whether the operation has an id and may be emitted.
    pub fn is_documented(&self) -> bool {
        !self.id.is_empty()
    }

    /// Fold `later` into `self`.
    ///
    /// Non-empty scalars from `later` overwrite, lists are appended in order,
    /// a `reads` sample from `later` wins and security schemes are inserted
    /// by name.
    pub fn merge(mut self, later: Operation) -> Operation {
        if !later.id.is_empty() {
            self.id = later.id;
        }
        if !later.summary.is_empty() {
            self.summary = later.summary;
        }
        self.tags.extend(later.tags);
        self.params.extend(later.params);
        self.consumes.extend(later.consumes);
        if later.reads.is_some() {
            self.reads = later.reads;
        }
        self.produces.extend(later.produces);
        self.returns.extend(later.returns);
        self.security.extend(later.security);
        self
    }
}

/// Start describing an operation.
pub fn op() -> OpBuilder {
    OpBuilder::default()
}

/// Chaining builder for [`Operation`]. Nothing is validated.
#[derive(Debug, Clone, Default)]
pub struct OpBuilder {
    op: Operation,
}

impl OpBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.op.id = id.into();
        self
    }

    pub fn doc(mut self, summary: impl Into<String>) -> Self {
        self.op.summary = summary.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.op.tags.push(tag.into());
        self
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.op.params.push(param);
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = Parameter>) -> Self {
        self.op.params.extend(params);
        self
    }

    /// Replace the consumed media types.
    pub fn consumes<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.op.consumes = media_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn reads(mut self, sample: Sample) -> Self {
        self.op.reads = Some(sample);
        self
    }

    /// Replace the produced media types.
    pub fn produces<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.op.produces = media_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn returns(
        mut self,
        code: u16,
        description: impl Into<String>,
        writes: impl Into<Option<Sample>>,
    ) -> Self {
        self.op.returns.push(Response {
            writes: writes.into(),
            ..Response::new(code, description)
        });
        self
    }

    pub fn response(mut self, response: Response) -> Self {
        self.op.returns.push(response);
        self
    }

    pub fn requires_auth(mut self, name: impl Into<String>, security: Security) -> Self {
        self.op.security.insert(name.into(), security);
        self
    }

    pub fn operation(self) -> Operation {
        self.op
    }

    /// A middleware that answers the sentinel with this operation and passes
    /// everything else through untouched.
    pub fn build<H: 'static>(self) -> Middleware<H> {
        let op = self.op;
        Arc::new(move |next: Next<H>| match next {
            Next::Sentinel => Next::Operation(op.clone()),
            other => other,
        })
    }

    /// Register this operation for `handler` and hand the handler back.
    pub fn build_handler<H: HandlerIdentity>(self, registry: &OperationRegistry, handler: H) -> H {
        registry.register(&handler, self.op);
        handler
    }
}
