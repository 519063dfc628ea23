//! Route registration and request matching.
//!
//! # Responsibilities
//! - Register routes, applying the active group stack
//! - Match requests against the method's routes and dispatch the first match
//! - Remember the last match for error handlers
//!
//! # Design Decisions
//! - First registered wins; no specificity ranking
//! - Group options are pushed by [`GroupScope`] and popped on drop
//! - Registration needs `&mut self`, matching only `&self`, so a finished
//!   router can be shared and swapped whole

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use axum::http::Method;
use parking_lot::Mutex;

use crate::dispatch::{DependencyResolver, MatchedController, RouteDispatcher};
use crate::http::{Request, Response};
use crate::observability::metrics;
use crate::routing::collection::RouteCollection;
use crate::routing::compiler::{CompiledRoute, RouteCompiler};
use crate::routing::error::RoutingError;
use crate::routing::group::{apply_group_settings, GroupOptions};
use crate::routing::parser::{ParsedRoute, RouteParser};
use crate::routing::route::{IntoControllerRef, Route, RouteOptions, SUPPORTED_METHODS};
use crate::routing::url_generator::UrlGenerator;

/// Default injected into the missing route for its controller.
pub const MISSING_ROUTE_STATUS_VAR: &str = "status_code";

#[derive(Debug, Clone)]
struct LastMatch {
    route: CompiledRoute,
    controller: Option<MatchedController>,
}

pub struct Router {
    collection: RouteCollection,
    parser: RouteParser,
    compiler: RouteCompiler,
    dispatcher: RouteDispatcher,
    group_stack: Vec<GroupOptions>,
    missing_route: Option<Arc<ParsedRoute>>,
    last_match: Mutex<Option<LastMatch>>,
}

impl Router {
    pub fn new(resolver: Arc<dyn DependencyResolver>) -> Self {
        Self::with_methods(resolver, &SUPPORTED_METHODS)
    }

    /// Router accepting only `methods`.
    pub fn with_methods(resolver: Arc<dyn DependencyResolver>, methods: &[Method]) -> Self {
        Self {
            collection: RouteCollection::new(methods),
            parser: RouteParser::new(),
            compiler: RouteCompiler::new(),
            dispatcher: RouteDispatcher::new(resolver),
            group_stack: Vec::new(),
            missing_route: None,
            last_match: Mutex::new(None),
        }
    }

    /// Dispatch unmatched requests to `controller` instead of failing with
    /// `NotFound`. The controller sees a `status_code` default of `404`.
    pub fn with_missing_route(mut self, controller: impl IntoControllerRef) -> Result<Self, RoutingError> {
        let route = Route::new(
            self.collection.supported_methods().to_vec(),
            "",
            controller,
            RouteOptions::new(),
        )?;
        let mut parsed = self.parser.parse(route)?;
        parsed.set_default_value(MISSING_ROUTE_STATUS_VAR, "404");
        parsed.set_id(self.collection.reserve_id());
        self.missing_route = Some(Arc::new(parsed));
        Ok(self)
    }

    pub fn get(
        &mut self,
        path: &str,
        controller: impl IntoControllerRef,
        options: RouteOptions,
    ) -> Result<Arc<ParsedRoute>, RoutingError> {
        self.multiple([Method::GET], path, controller, options)
    }

    pub fn post(
        &mut self,
        path: &str,
        controller: impl IntoControllerRef,
        options: RouteOptions,
    ) -> Result<Arc<ParsedRoute>, RoutingError> {
        self.multiple([Method::POST], path, controller, options)
    }

    pub fn put(
        &mut self,
        path: &str,
        controller: impl IntoControllerRef,
        options: RouteOptions,
    ) -> Result<Arc<ParsedRoute>, RoutingError> {
        self.multiple([Method::PUT], path, controller, options)
    }

    pub fn delete(
        &mut self,
        path: &str,
        controller: impl IntoControllerRef,
        options: RouteOptions,
    ) -> Result<Arc<ParsedRoute>, RoutingError> {
        self.multiple([Method::DELETE], path, controller, options)
    }

    pub fn head(
        &mut self,
        path: &str,
        controller: impl IntoControllerRef,
        options: RouteOptions,
    ) -> Result<Arc<ParsedRoute>, RoutingError> {
        self.multiple([Method::HEAD], path, controller, options)
    }

    pub fn options(
        &mut self,
        path: &str,
        controller: impl IntoControllerRef,
        options: RouteOptions,
    ) -> Result<Arc<ParsedRoute>, RoutingError> {
        self.multiple([Method::OPTIONS], path, controller, options)
    }

    pub fn patch(
        &mut self,
        path: &str,
        controller: impl IntoControllerRef,
        options: RouteOptions,
    ) -> Result<Arc<ParsedRoute>, RoutingError> {
        self.multiple([Method::PATCH], path, controller, options)
    }

    /// One route answering every supported method.
    pub fn any(
        &mut self,
        path: &str,
        controller: impl IntoControllerRef,
        options: RouteOptions,
    ) -> Result<Arc<ParsedRoute>, RoutingError> {
        let methods = self.collection.supported_methods().to_vec();
        self.multiple(methods, path, controller, options)
    }

    /// One route answering each of `methods`.
    pub fn multiple<I>(
        &mut self,
        methods: I,
        path: &str,
        controller: impl IntoControllerRef,
        options: RouteOptions,
    ) -> Result<Arc<ParsedRoute>, RoutingError>
    where
        I: IntoIterator<Item = Method>,
    {
        let route = Route::new(methods, path, controller, options)?;
        self.add_route(route)
    }

    /// Apply the group stack, parse, and store a route.
    pub fn add_route(&mut self, route: Route) -> Result<Arc<ParsedRoute>, RoutingError> {
        let route = apply_group_settings(&self.group_stack, route);
        let parsed = self.parser.parse(route)?;
        let parsed = self.collection.add(parsed)?;

        tracing::debug!(
            id = %parsed.id(),
            methods = ?parsed.methods(),
            path = %parsed.raw_path(),
            host = %parsed.raw_host(),
            controller = %parsed.controller(),
            "Route registered"
        );
        Ok(parsed)
    }

    /// Register routes inside a group. The options apply to everything the
    /// callback registers and are removed again however the callback exits.
    pub fn group<F>(&mut self, options: GroupOptions, callback: F) -> Result<(), RoutingError>
    where
        F: FnOnce(&mut Router) -> Result<(), RoutingError>,
    {
        let mut scope = GroupScope::enter(self, options);
        callback(&mut *scope)
    }

    /// Number of group levels currently open.
    pub fn group_depth(&self) -> usize {
        self.group_stack.len()
    }

    /// First route matching `request`, without dispatching it.
    pub fn find(&self, request: &Request) -> Option<CompiledRoute> {
        self.collection
            .get(request.method())
            .iter()
            .map(|candidate| self.compiler.compile(candidate, request))
            .find(CompiledRoute::is_match)
    }

    /// Match `request` and dispatch the first matching route.
    pub fn route(&self, request: Request) -> Result<Response, RoutingError> {
        let started = Instant::now();
        let method = request.method().clone();

        let found = self.find(&request);
        metrics::record_match_duration(started);
        if let Some(compiled) = found {
            tracing::debug!(
                route = %compiled.route().id(),
                method = %method,
                path = %request.path(),
                pattern = %compiled.route().path_pattern(),
                "Route matched"
            );
            return self.dispatch(compiled, request);
        }

        if let Some(missing) = &self.missing_route {
            tracing::debug!(method = %method, path = %request.path(), "Dispatching missing route");
            let compiled = CompiledRoute::new(missing.clone(), true, HashMap::new());
            return self.dispatch(compiled, request);
        }

        *self.last_match.lock() = None;
        metrics::record_not_found();
        tracing::warn!(method = %method, path = %request.path(), host = %request.host(), "No route matched");
        Err(RoutingError::NotFound {
            method,
            path: request.path().to_string(),
        })
    }

    fn dispatch(&self, compiled: CompiledRoute, request: Request) -> Result<Response, RoutingError> {
        let result = self.dispatcher.dispatch(&compiled, request);
        if let Err(e) = &result {
            metrics::record_dispatch_error(e.kind());
            tracing::error!(
                route = %compiled.route().id(),
                controller = %compiled.route().controller(),
                error = %e,
                "Dispatch failed"
            );
        }

        // One write: route and controller always come from the same call.
        let controller = result.as_ref().ok().and_then(|dispatched| dispatched.controller.clone());
        *self.last_match.lock() = Some(LastMatch {
            route: compiled,
            controller,
        });

        result.map(|dispatched| dispatched.response).map_err(RoutingError::from)
    }

    /// Route matched by the most recent `route` call.
    pub fn matched_route(&self) -> Option<CompiledRoute> {
        self.last_match.lock().as_ref().map(|last| last.route.clone())
    }

    /// Controller that handled the most recent `route` call.
    pub fn matched_controller(&self) -> Option<MatchedController> {
        self.last_match
            .lock()
            .as_ref()
            .and_then(|last| last.controller.clone())
    }

    pub fn collection(&self) -> &RouteCollection {
        &self.collection
    }

    pub fn dispatcher(&self) -> &RouteDispatcher {
        &self.dispatcher
    }

    pub fn url_generator(&self) -> UrlGenerator<'_> {
        UrlGenerator::new(&self.collection)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.collection.len())
            .field("group_depth", &self.group_stack.len())
            .field("missing_route", &self.missing_route.is_some())
            .finish()
    }
}

/// An open group. Pops its options when dropped.
pub struct GroupScope<'a> {
    router: &'a mut Router,
}

impl<'a> GroupScope<'a> {
    pub fn enter(router: &'a mut Router, options: GroupOptions) -> Self {
        router.group_stack.push(options);
        Self { router }
    }
}

impl Deref for GroupScope<'_> {
    type Target = Router;

    fn deref(&self) -> &Router {
        self.router
    }
}

impl DerefMut for GroupScope<'_> {
    fn deref_mut(&mut self) -> &mut Router {
        self.router
    }
}

impl Drop for GroupScope<'_> {
    fn drop(&mut self) {
        self.router.group_stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Container, Next};
    use crate::http::controllers::default_container;
    use crate::routing::error::FormatError;
    use crate::routing::group::GroupOptions;
    use crate::routing::route::ControllerRef;

    fn router() -> Router {
        Router::new(Arc::new(Container::new()))
    }

    fn echo(label: &'static str) -> ControllerRef {
        ControllerRef::closure(move |_| Ok(Response::text(label)))
    }

    #[test]
    fn test_nested_group_paths() {
        let mut router = router();
        router
            .group(GroupOptions::new().path("/a"), |r| {
                r.group(GroupOptions::new().path("/b"), |r| {
                    r.get("/c", echo("c"), RouteOptions::new())?;
                    Ok(())
                })
            })
            .unwrap();

        let route = &router.collection().get(&Method::GET)[0];
        assert_eq!(route.raw_path(), "/a/b/c");
        assert_eq!(router.group_depth(), 0);
        assert_eq!(router.route(Request::get("/a/b/c")).unwrap().body(), "c");
    }

    #[test]
    fn test_group_stack_popped_on_error() {
        let mut router = router();
        let result = router.group(GroupOptions::new().path("/admin"), |r| {
            r.get("/{id}/{id}", echo("x"), RouteOptions::new())?;
            Ok(())
        });
        assert!(matches!(
            result,
            Err(RoutingError::Format(FormatError::DuplicateVariable { .. }))
        ));
        assert_eq!(router.group_depth(), 0);

        let route = router.get("/users", echo("users"), RouteOptions::new()).unwrap();
        assert_eq!(route.raw_path(), "/users");
    }

    #[test]
    fn test_first_registered_wins() {
        let mut router = router();
        router.get("/users/{id}", echo("by-id"), RouteOptions::new()).unwrap();
        router.get("/users/new", echo("new"), RouteOptions::new()).unwrap();

        let response = router.route(Request::get("/users/new")).unwrap();
        assert_eq!(response.body(), "by-id");
        assert_eq!(
            router.matched_route().unwrap().route().raw_path(),
            "/users/{id}"
        );
    }

    #[test]
    fn test_not_found() {
        let mut router = router();
        router.get("/users", echo("users"), RouteOptions::new()).unwrap();
        router.route(Request::get("/users")).unwrap();

        let err = router.route(Request::get("/missing")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
        assert!(router.matched_route().is_none());

        let err = router.route(Request::new(Method::POST, "/users")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_route_fallback() {
        let mut router = router()
            .with_missing_route(ControllerRef::closure(|ctx| {
                Ok(Response::text(format!(
                    "status {}",
                    ctx.var(MISSING_ROUTE_STATUS_VAR).unwrap_or("?")
                )))
            }))
            .unwrap();
        router.get("/users", echo("users"), RouteOptions::new()).unwrap();

        let response = router.route(Request::get("/nowhere")).unwrap();
        assert_eq!(response.body(), "status 404");
        assert!(router.matched_route().unwrap().bindings().is_empty());
    }

    #[test]
    fn test_any_and_multiple() {
        let mut router = router();
        let any = router.any("/ping", echo("pong"), RouteOptions::new()).unwrap();
        assert_eq!(any.methods().len(), SUPPORTED_METHODS.len());
        for method in SUPPORTED_METHODS {
            assert_eq!(router.collection().get(&method).len(), 1);
        }

        router
            .multiple([Method::PUT, Method::PATCH], "/users/{id}", echo("update"), RouteOptions::new())
            .unwrap();
        assert_eq!(
            router.route(Request::new(Method::PATCH, "/users/1")).unwrap().body(),
            "update"
        );
        assert!(router.route(Request::new(Method::DELETE, "/users/1")).is_err());
    }

    #[test]
    fn test_https_group_forces_secure() {
        let mut router = router();
        router
            .group(GroupOptions::new().https(true), |r| {
                r.group(GroupOptions::new().https(false), |r| {
                    r.get("/account", echo("account"), RouteOptions::new().https(false))?;
                    Ok(())
                })
            })
            .unwrap();

        assert!(router.collection().get(&Method::GET)[0].is_secure());
        assert!(router.route(Request::get("/account")).is_err());
        assert!(router.route(Request::get("/account").with_secure(true)).is_ok());
    }

    #[test]
    fn test_three_level_host_nesting() {
        let mut router = router();
        router
            .group(GroupOptions::new().host("example.com"), |r| {
                r.group(GroupOptions::new().host("api."), |r| {
                    r.group(GroupOptions::new().host("{version}."), |r| {
                        r.get("/status", echo("ok"), RouteOptions::new())?;
                        Ok(())
                    })
                })
            })
            .unwrap();

        let route = &router.collection().get(&Method::GET)[0];
        assert_eq!(route.raw_host(), "{version}.api.example.com");

        let request = Request::get("/status").with_host("v2.api.example.com");
        assert!(router.route(request).is_ok());
        assert_eq!(router.matched_route().unwrap().binding("version"), Some("v2"));
        assert!(router.route(Request::get("/status").with_host("api.example.com")).is_err());
    }

    #[test]
    fn test_last_match_is_recorded_whole() {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel::<()>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let entered = Mutex::new(entered_tx);
        let release = Mutex::new(release_rx);

        let container = default_container();
        container.bind_middleware_instance(
            "Hold",
            Arc::new(move |request: Request, next: Next<'_>| {
                let _ = entered.lock().send(());
                let _ = release.lock().recv();
                next.run(request)
            }),
        );
        let mut router = Router::new(Arc::new(container));
        router.get("/slow", "Echo@slow", RouteOptions::new().middleware("Hold")).unwrap();
        router.get("/fast", echo("fast"), RouteOptions::new()).unwrap();
        let router = Arc::new(router);

        let slow = {
            let router = router.clone();
            std::thread::spawn(move || router.route(Request::get("/slow")).map(|r| r.status()))
        };
        entered_rx.recv().unwrap();
        router.route(Request::get("/fast")).unwrap();
        release_tx.send(()).unwrap();
        assert!(slow.join().unwrap().is_ok());

        assert_eq!(router.matched_route().unwrap().route().raw_path(), "/slow");
        assert_eq!(
            router.matched_controller().as_ref().and_then(MatchedController::class),
            Some("Echo")
        );
    }

    #[test]
    fn test_invalid_controller_string() {
        let mut router = router();
        let err = router.get("/x", "NoSeparator", RouteOptions::new()).unwrap_err();
        assert!(matches!(err, RoutingError::Format(FormatError::InvalidController(_))));
        assert!(router.collection().is_empty());
    }
}
