//! Walk a router and build the document.

use log::{debug, info};

use crate::config::SpecConfig;
use crate::doc::Document;
use crate::error::BuildError;
use crate::op::{Next, Operation};
use crate::registry::{HandlerIdentity, OperationRegistry};
use crate::router::{RouteEntry, Routes};
use crate::synth::Generator;

/// Build a document from every documented route of `routes`.
///
/// A route's operation is the merge, in order, of what each middleware on its
/// chain answers to the sentinel, followed by the registry entry for its
/// handler. Routes without an operation id are skipped. The first synthesis
/// error aborts the build.
pub fn build_spec<R, H>(
    routes: &R,
    registry: &OperationRegistry,
    config: &SpecConfig,
) -> Result<Document, BuildError>
where
    R: Routes<H>,
    H: HandlerIdentity,
{
    let mut generator = Generator::new(config.info(), config.obj_pkg_segments);
    routes.walk(|route| {
        let path = config.strip_prefix(route.path);
        let Some(op) = collect_operation(&route, registry) else {
            debug!("skipping undocumented route {} {path}", route.method);
            return Ok(());
        };
        if !op.is_documented() {
            debug!("skipping route {} {path} with empty operation id", route.method);
            return Ok(());
        }
        generator.add_operation(route.method, path, &op)
    })?;

    let doc = generator.into_document();
    info!(
        "built document with {} paths and {} schemas",
        doc.paths.len(),
        doc.components.schemas.len()
    );
    Ok(doc)
}

fn collect_operation<H: HandlerIdentity>(
    route: &RouteEntry<'_, H>,
    registry: &OperationRegistry,
) -> Option<Operation> {
    route
        .middlewares
        .iter()
        .filter_map(|middleware| match middleware(Next::Sentinel) {
            Next::Operation(op) => Some(op),
            _ => None,
        })
        .chain(registry.lookup(route.handler))
        .reduce(Operation::merge)
}
