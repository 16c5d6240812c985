//! Radix-tree request router plus the application middleware stack.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. The
//! router is also where the middleware stack lives: every request — matched
//! or not — traverses the stack, so a logging or asset-serving interceptor
//! sees traffic the routing tables know nothing about.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::Middleware;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    stack: Vec<Arc<dyn Middleware>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), stack: Vec::new() }
    }

    /// Appends a middleware link. Links run in the order they were added,
    /// before the matched handler, for every request.
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        self.stack.push(Arc::new(middleware));
        self
    }

    /// Registers a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves
    /// them:
    ///
    /// ```rust,no_run
    /// # use slipway::{Method, Request, Responder, Response, Router};
    /// # fn get_user(_: Request, r: Responder) { r.respond(Response::text("")) }
    /// # fn create_user(_: Request, r: Responder) { r.respond(Response::text("")) }
    /// Router::new()
    ///     .on(Method::Get,  "/users/{id}", get_user)
    ///     .on(Method::Post, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics on an invalid or conflicting route pattern — registration is a
    /// startup-time activity and a bad table should not boot.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, path, handler)
    }

    pub(crate) fn stack(&self) -> &[Arc<dyn Middleware>] {
        &self.stack
    }

    pub(crate) fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::responder::Responder;
    use crate::response::Response;

    fn noop(_req: Request, responder: Responder) {
        responder.respond(Response::text("ok"));
    }

    #[test]
    fn lookup_extracts_params() {
        let router = Router::new().get("/users/{id}", noop);
        let (_, params) = router.lookup(Method::Get, "/users/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn lookup_respects_method() {
        let router = Router::new().get("/users", noop);
        assert!(router.lookup(Method::Post, "/users").is_none());
        assert!(router.lookup(Method::Get, "/nope").is_none());
    }
}
