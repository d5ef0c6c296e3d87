//! Route enumeration and a small in-memory router.
//!
//! The document builder only needs [`Routes`]; [`Router`] is a minimal
//! implementation for applications without a router of their own and for
//! tests.

use std::convert::Infallible;

use crate::doc::HttpMethod;
use crate::op::{Middleware, Next};

/// One registered route as seen by a walk.
///
/// `middlewares` is the full chain, outermost first.
pub struct RouteEntry<'a, H> {
    pub method: HttpMethod,
    pub path: &'a str,
    pub handler: &'a H,
    pub middlewares: &'a [Middleware<H>],
}

/// A router whose routes can be enumerated in registration order.
pub trait Routes<H> {
    fn walk<F, E>(&self, visit: F) -> Result<(), E>
    where
        F: FnMut(RouteEntry<'_, H>) -> Result<(), E>;
}

struct Route<H> {
    method: HttpMethod,
    path: String,
    handler: H,
    middlewares: Vec<Middleware<H>>,
}

enum Entry<H> {
    Route(Route<H>),
    Mount { prefix: String, router: Router<H> },
}

/// Routes grouped under middleware stacks and mounted sub-routers.
pub struct Router<H> {
    middlewares: Vec<Middleware<H>>,
    entries: Vec<Entry<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self {
            middlewares: Vec::new(),
            entries: Vec::new(),
        }
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware applied to every route of this router.
    pub fn use_middleware(&mut self, middleware: Middleware<H>) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Mount a sub-router under `prefix`.
    pub fn route(&mut self, prefix: impl Into<String>, build: impl FnOnce(&mut Router<H>)) -> &mut Self {
        let mut router = Router::new();
        build(&mut router);
        self.entries.push(Entry::Mount {
            prefix: prefix.into(),
            router,
        });
        self
    }

    /// Start an inline middleware scope for the routes registered through it.
    pub fn with(&mut self, middleware: Middleware<H>) -> Scope<'_, H> {
        Scope {
            router: self,
            middlewares: vec![middleware],
        }
    }

    pub fn handle(&mut self, method: HttpMethod, path: impl Into<String>, handler: H) -> &mut Self {
        self.push(method, path.into(), handler, Vec::new());
        self
    }

    pub fn get(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.handle(HttpMethod::Get, path, handler)
    }

    pub fn post(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.handle(HttpMethod::Post, path, handler)
    }

    pub fn put(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.handle(HttpMethod::Put, path, handler)
    }

    pub fn delete(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.handle(HttpMethod::Delete, path, handler)
    }

    pub fn patch(&mut self, path: impl Into<String>, handler: H) -> &mut Self {
        self.handle(HttpMethod::Patch, path, handler)
    }

    fn push(&mut self, method: HttpMethod, path: String, handler: H, middlewares: Vec<Middleware<H>>) {
        self.entries.push(Entry::Route(Route {
            method,
            path,
            handler,
            middlewares,
        }));
    }

    fn walk_from<F, E>(&self, prefix: &str, chain: &[Middleware<H>], visit: &mut F) -> Result<(), E>
    where
        F: FnMut(RouteEntry<'_, H>) -> Result<(), E>,
    {
        let mut chain = chain.to_vec();
        chain.extend(self.middlewares.iter().cloned());
        for entry in &self.entries {
            match entry {
                Entry::Route(route) => {
                    let path = join_path(prefix, &route.path);
                    let mut full = chain.clone();
                    full.extend(route.middlewares.iter().cloned());
                    visit(RouteEntry {
                        method: route.method,
                        path: &path,
                        handler: &route.handler,
                        middlewares: &full,
                    })?;
                }
                Entry::Mount { prefix: sub, router } => {
                    router.walk_from(&join_path(prefix, sub), &chain, visit)?;
                }
            }
        }
        Ok(())
    }
}

impl<H: Clone> Router<H> {
    /// Resolve the handler serving `method` and `path`, passed through every
    /// middleware on its chain.
    pub fn handler(&self, method: HttpMethod, path: &str) -> Option<H> {
        let mut found = None;
        let _ = self.walk(|entry| -> Result<(), Infallible> {
            if found.is_none() && entry.method == method && entry.path == path {
                let mut next = Next::Handler(entry.handler.clone());
                for middleware in entry.middlewares.iter().rev() {
                    next = middleware(next);
                }
                if let Next::Handler(handler) = next {
                    found = Some(handler);
                }
            }
            Ok(())
        });
        found
    }
}

impl<H> Routes<H> for Router<H> {
    fn walk<F, E>(&self, mut visit: F) -> Result<(), E>
    where
        F: FnMut(RouteEntry<'_, H>) -> Result<(), E>,
    {
        self.walk_from("", &[], &mut visit)
    }
}

/// Routes registered with extra inline middlewares.
pub struct Scope<'r, H> {
    router: &'r mut Router<H>,
    middlewares: Vec<Middleware<H>>,
}

impl<H> Scope<'_, H> {
    pub fn with(mut self, middleware: Middleware<H>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn handle(self, method: HttpMethod, path: impl Into<String>, handler: H) {
        self.router
            .push(method, path.into(), handler, self.middlewares);
    }

    pub fn get(self, path: impl Into<String>, handler: H) {
        self.handle(HttpMethod::Get, path, handler)
    }

    pub fn post(self, path: impl Into<String>, handler: H) {
        self.handle(HttpMethod::Post, path, handler)
    }

    pub fn put(self, path: impl Into<String>, handler: H) {
        self.handle(HttpMethod::Put, path, handler)
    }

    pub fn delete(self, path: impl Into<String>, handler: H) {
        self.handle(HttpMethod::Delete, path, handler)
    }

    pub fn patch(self, path: impl Into<String>, handler: H) {
        self.handle(HttpMethod::Patch, path, handler)
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        return path.to_string();
    }
    if path.is_empty() || path == "/" {
        return prefix.to_string();
    }
    format!("{}/{}", prefix.trim_end_matches('/'), path.trim_start_matches('/'))
}
