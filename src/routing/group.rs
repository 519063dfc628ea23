//! Route groups.
//!
//! A group contributes shared settings to every route registered inside it.
//! Settings compose outer to inner:
//! - paths concatenate outer first
//! - hosts fold as `host = entry.host + host`
//! - middleware concatenates outer first and is prepended to the route's own
//! - variable constraints merge, inner overriding outer, route overriding both
//! - https is forced on if any enclosing group asks for it
//! - controller namespaces concatenate, each fragment ending in `::`

use std::collections::HashMap;

use crate::routing::route::{ControllerRef, MiddlewareDescriptor, Route};

/// Separator appended to every controller namespace fragment.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Options of one group level.
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    pub path: Option<String>,
    pub host: Option<String>,
    pub middleware: Vec<MiddlewareDescriptor>,
    pub https: Option<bool>,
    pub controller_namespace: Option<String>,
    pub vars: HashMap<String, String>,
}

impl GroupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn middleware(mut self, middleware: impl Into<MiddlewareDescriptor>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    pub fn https(mut self, https: bool) -> Self {
        self.https = Some(https);
        self
    }

    pub fn controller_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.controller_namespace = Some(namespace.into());
        self
    }

    pub fn var(mut self, name: impl Into<String>, regex: impl Into<String>) -> Self {
        self.vars.insert(name.into(), regex.into());
        self
    }
}

/// Settings folded from a whole stack of group options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupSettings {
    pub path: String,
    pub host: String,
    pub middleware: Vec<MiddlewareDescriptor>,
    pub vars: HashMap<String, String>,
    pub secure: bool,
    pub controller_namespace: String,
}

impl GroupSettings {
    /// Fold a stack given outermost first.
    pub fn from_stack(stack: &[GroupOptions]) -> Self {
        let mut settings = GroupSettings::default();

        for options in stack {
            if let Some(path) = &options.path {
                settings.path.push_str(path);
            }
            if let Some(host) = &options.host {
                settings.host = format!("{}{}", host, settings.host);
            }
            settings.middleware.extend(options.middleware.iter().cloned());
            settings
                .vars
                .extend(options.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
            if options.https == Some(true) {
                settings.secure = true;
            }
            if let Some(namespace) = &options.controller_namespace {
                settings.controller_namespace.push_str(namespace);
                if !settings.controller_namespace.ends_with(NAMESPACE_SEPARATOR) {
                    settings.controller_namespace.push_str(NAMESPACE_SEPARATOR);
                }
            }
        }

        settings
    }
}

/// Apply the active group stack to a route.
pub fn apply_group_settings(stack: &[GroupOptions], mut route: Route) -> Route {
    if stack.is_empty() {
        return route;
    }
    let settings = GroupSettings::from_stack(stack);

    route.set_raw_path(format!("{}{}", settings.path, route.raw_path()));
    route.set_raw_host(format!("{}{}", settings.host, route.raw_host()));

    if let ControllerRef::Named { class, .. } = route.controller_mut() {
        if !settings.controller_namespace.is_empty() {
            *class = format!("{}{}", settings.controller_namespace, class);
        }
    }

    route.set_secure(settings.secure || route.is_secure());

    let mut vars = settings.vars;
    vars.extend(
        route
            .var_regexes()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    route.set_var_regexes(vars);

    if !settings.middleware.is_empty() {
        let mut middleware: Vec<MiddlewareDescriptor> = Vec::new();
        for descriptor in settings.middleware.into_iter().chain(route.middleware().iter().cloned()) {
            if !middleware.contains(&descriptor) {
                middleware.push(descriptor);
            }
        }
        route.set_middleware(middleware);
    }

    route
}
