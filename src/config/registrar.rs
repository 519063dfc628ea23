//! Turns route and group tables into router registrations.
//!
//! Top-level routes register first, then groups depth-first, each in file
//! order. Registration order is match order.

use std::sync::Arc;

use axum::http::Method;

use crate::config::loader::ConfigError;
use crate::config::schema::{AppConfig, GroupConfig, RouteConfig};
use crate::config::validation::{supported_methods, validate_config, ANY_METHOD};
use crate::dispatch::DependencyResolver;
use crate::routing::{GroupOptions, RouteOptions, Router, RoutingError};

/// Build a router for `config`, resolving controllers through `resolver`.
pub fn build_router(config: &AppConfig, resolver: Arc<dyn DependencyResolver>) -> Result<Router, ConfigError> {
    validate_config(config).map_err(ConfigError::Validation)?;
    let methods = supported_methods(config).map_err(ConfigError::Validation)?;

    let mut router = Router::with_methods(resolver, &methods);
    if let Some(controller) = &config.routing.missing_route_controller {
        router = router.with_missing_route(controller.as_str())?;
    }

    for route in &config.routes {
        register_route(&mut router, route)?;
    }
    for group in &config.groups {
        register_group(&mut router, group)?;
    }

    tracing::info!(
        routes = router.collection().len(),
        groups = config.groups.len(),
        "Router built from configuration"
    );
    Ok(router)
}

fn register_group(router: &mut Router, group: &GroupConfig) -> Result<(), RoutingError> {
    let mut options = GroupOptions::new()
        .path(group.path.as_str())
        .host(group.host.as_str());
    if !group.controller_namespace.is_empty() {
        options = options.controller_namespace(group.controller_namespace.as_str());
    }
    if let Some(https) = group.https {
        options = options.https(https);
    }
    for (name, regex) in &group.vars {
        options = options.var(name.as_str(), regex.as_str());
    }
    for middleware in &group.middleware {
        options = options.middleware(middleware.clone());
    }

    router.group(options, |router| {
        for route in &group.routes {
            register_route(router, route)?;
        }
        for nested in &group.groups {
            register_group(router, nested)?;
        }
        Ok(())
    })
}

fn register_route(router: &mut Router, route: &RouteConfig) -> Result<(), RoutingError> {
    let mut options = RouteOptions::new()
        .https(route.https)
        .middlewares(route.middleware.iter().cloned());
    for (name, regex) in &route.vars {
        options = options.var(name.as_str(), regex.as_str());
    }
    if let Some(host) = &route.host {
        options = options.host(host.as_str());
    }
    if let Some(name) = &route.name {
        options = options.name(name.as_str());
    }

    let methods = route_methods(router, route);
    router.multiple(methods, &route.path, route.controller.as_str(), options)?;
    Ok(())
}

fn route_methods(router: &Router, route: &RouteConfig) -> Vec<Method> {
    if route.methods.iter().any(|m| m.eq_ignore_ascii_case(ANY_METHOD)) {
        return router.collection().supported_methods().to_vec();
    }
    route
        .methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
        .collect()
}
